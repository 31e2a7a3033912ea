use health_core::Checker;
use std::net::SocketAddr;
use std::time::Duration;

pub async fn wait_for_addr(checker: &Checker) -> SocketAddr {
    for _ in 0..200 {
        if let Some(addr) = checker.local_addr() {
            return addr;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("health server did not start listening");
}

pub fn url(addr: SocketAddr, path: &str) -> String {
    format!("http://{}{}", addr, path)
}
