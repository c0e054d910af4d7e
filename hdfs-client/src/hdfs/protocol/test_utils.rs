use std::{
  io::{Read, Write},
  net::{TcpListener, TcpStream},
  sync::{Arc, Mutex},
  thread::{self, JoinHandle},
  time::Duration,
};

#[derive(new, Debug, Clone)]
pub(crate) struct CannedResponse {
  status: u16,
  #[new(default)]
  headers: Vec<(String, String)>,
  #[new(default)]
  body: String,
  /// Pause before each body byte.
  #[new(default)]
  trickle: Option<Duration>,
}

impl CannedResponse {
  pub(crate) fn json(status: u16, body: &str) -> Self {
    let mut response = Self::new(status);
    response.headers.push(("Content-Type".to_string(), "application/json".to_string()));
    response.body = body.to_string();
    response
  }

  pub(crate) fn redirect(location: &str) -> Self {
    let mut response = Self::new(307);
    response.headers.push(("Location".to_string(), location.to_string()));
    response
  }

  pub(crate) fn octets(body: &str) -> Self {
    let mut response = Self::new(200);
    response.headers.push(("Content-Type".to_string(), "application/octet-stream".to_string()));
    response.body = body.to_string();
    response
  }

  /// Sends the body one byte at a time, pausing `interval` before each byte.
  pub(crate) fn trickle(mut self, interval: Duration) -> Self {
    self.trickle = Some(interval);
    self
  }
}

#[derive(Debug, Clone, Getters)]
#[get = "pub(crate)"]
pub(crate) struct RecordedRequest {
  method: String,
  target: String,
  body: Vec<u8>,
}

/// Serves the canned responses in order, one connection per request.
pub(crate) struct TestServer {
  address: String,
  requests: Arc<Mutex<Vec<RecordedRequest>>>,
  handle: Option<JoinHandle<()>>,
}

impl TestServer {
  pub(crate) fn start(responses: Vec<CannedResponse>) -> Self {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap().to_string();
    let requests = Arc::new(Mutex::new(Vec::new()));

    let recorded = requests.clone();
    let handle = thread::spawn(move || {
      for response in responses {
        let (mut stream, _) = match listener.accept() {
          Ok(s) => s,
          Err(_) => return,
        };
        if let Some(request) = read_request(&mut stream) {
          recorded.lock().unwrap().push(request);
        }
        write_response(&mut stream, &response);
      }
    });

    Self { address, requests, handle: Some(handle) }
  }

  pub(crate) fn address(&self) -> &str {
    &self.address
  }

  pub(crate) fn url(&self, path: &str) -> String {
    format!("http://{}{}", self.address, path)
  }

  pub(crate) fn requests(&self) -> Vec<RecordedRequest> {
    self.requests.lock().unwrap().clone()
  }

  /// Waits until every canned response was served.
  pub(crate) fn finish(mut self) -> Vec<RecordedRequest> {
    if let Some(handle) = self.handle.take() {
      handle.join().unwrap();
    }
    self.requests()
  }
}

fn read_request(stream: &mut TcpStream) -> Option<RecordedRequest> {
  let mut data = Vec::new();
  let mut buf = [0u8; 1024];
  let header_end = loop {
    if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
      break pos + 4;
    }
    let n = stream.read(&mut buf).ok()?;
    if n == 0 {
      return None;
    }
    data.extend_from_slice(&buf[..n]);
  };

  let head = String::from_utf8_lossy(&data[..header_end]).into_owned();
  let mut lines = head.split("\r\n");
  let mut request_line = lines.next()?.split(' ');
  let method = request_line.next()?.to_string();
  let target = request_line.next()?.to_string();

  let content_length = lines
    .filter_map(|l| l.split_once(':'))
    .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
    .unwrap_or(0);

  let mut body = data[header_end..].to_vec();
  while body.len() < content_length {
    let n = stream.read(&mut buf).ok()?;
    if n == 0 {
      break;
    }
    body.extend_from_slice(&buf[..n]);
  }

  Some(RecordedRequest { method, target, body })
}

fn write_response(stream: &mut TcpStream, response: &CannedResponse) {
  let mut head = format!("HTTP/1.1 {} Canned\r\n", response.status);
  for (name, value) in &response.headers {
    head.push_str(&format!("{}: {}\r\n", name, value));
  }
  head.push_str(&format!("Content-Length: {}\r\nConnection: close\r\n\r\n", response.body.len()));

  let _ = stream.write_all(head.as_bytes());
  match response.trickle {
    Some(interval) => {
      let _ = stream.set_nodelay(true);
      let _ = stream.flush();
      for byte in response.body.as_bytes() {
        thread::sleep(interval);
        if stream.write_all(&[*byte]).and_then(|_| stream.flush()).is_err() {
          return;
        }
      }
    }
    None => {
      let _ = stream.write_all(response.body.as_bytes());
    }
  }
  let _ = stream.flush();
}
