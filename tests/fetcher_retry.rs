//! Retry behavior against a local stub server: bounded attempts, eventual
//! success, and `None` once the budget is spent.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use nba_scraper::fetcher::Fetcher;
use nba_scraper::Config;

/// Serves canned HTTP responses in order, then keeps replying with the last
/// one. Returns the base URL and a counter of requests actually received.
fn stub_server(responses: Vec<String>) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);

    thread::spawn(move || {
        for stream in listener.incoming() {
            let mut stream = match stream {
                Ok(s) => s,
                Err(_) => break,
            };
            let n = counter.fetch_add(1, Ordering::SeqCst);
            // Drain the request head before answering.
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf);
            let response = responses.get(n).unwrap_or_else(|| responses.last().unwrap());
            let _ = stream.write_all(response.as_bytes());
        }
    });

    (format!("http://{}", addr), hits)
}

fn http_500() -> String {
    "HTTP/1.1 500 Internal Server Error\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
        .to_string()
}

fn http_200(body: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\ncontent-type: text/html\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
        body.len(),
        body
    )
}

fn test_config(base_url: &str, max_retries: u32) -> Config {
    Config {
        base_url: base_url.to_string(),
        request_delay_secs: 0.0,
        max_retries,
        ..Config::default()
    }
}

#[test]
fn gives_up_after_the_configured_number_of_attempts() {
    let (base, hits) = stub_server(vec![http_500()]);
    let mut fetcher = Fetcher::new(&test_config(&base, 2)).unwrap();

    assert_eq!(fetcher.fetch("/stats/players/pts"), None);
    assert_eq!(hits.load(Ordering::SeqCst), 2);

    // A later fetch starts a fresh budget rather than staying given-up.
    assert_eq!(fetcher.fetch("/stats/teams"), None);
    assert_eq!(hits.load(Ordering::SeqCst), 4);
}

#[test]
fn recovers_when_a_retry_succeeds() {
    let (base, hits) = stub_server(vec![http_500(), http_200("<html>ok</html>")]);
    let mut fetcher = Fetcher::new(&test_config(&base, 3)).unwrap();

    let body = fetcher.fetch("/standings");
    assert_eq!(body.as_deref(), Some("<html>ok</html>"));
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[test]
fn success_on_the_first_attempt_makes_one_request() {
    let (base, hits) = stub_server(vec![http_200("<table></table>")]);
    let mut fetcher = Fetcher::new(&test_config(&base, 3)).unwrap();

    assert!(fetcher.fetch("/players/lakers").is_some());
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}
