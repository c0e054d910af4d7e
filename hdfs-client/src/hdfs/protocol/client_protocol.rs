use crate::{
  error::{
    HdfsClientError,
    HdfsClientErrorKind::{
      AuthenticationError, ConnectionError, InvalidArgumentError, IoError, NotFound,
      TimeOutError,
    },
    Result,
  },
  fs::{
    file_status::FileStatus,
    input_stream::{FsInputStream, FsOutputStream},
    path::SEPARATOR,
  },
  hdfs::{
    hdfs_config::HdfsClientConfig,
    protocol::message::{
      BooleanResponse, FileStatusResponse, ListStatusResponse, RemoteExceptionResponse,
    },
  },
  security::user::SubjectRef,
};
use failure::{Fail, ResultExt};
use reqwest::{
  blocking::{Client, RequestBuilder, Response},
  header::LOCATION,
  redirect::Policy,
  Method, StatusCode,
};
use serde::de::DeserializeOwned;
use std::{
  cell::RefCell,
  io::{self, Read, Write},
  time::Duration,
};
use url::Url;

/// Namenode operations the filesystem is built on.
pub trait ClientProtocol {
  /// `None` when nothing exists at `path`.
  fn get_file_info(&self, conf: &HdfsClientConfig, path: &str) -> Result<Option<FileStatus>>;

  fn get_listing(&self, conf: &HdfsClientConfig, path: &str) -> Result<Vec<FileStatus>>;

  fn open(&self, conf: &HdfsClientConfig, path: &str) -> Result<Box<dyn FsInputStream>>;

  fn create(
    &self,
    conf: &HdfsClientConfig,
    path: &str,
    overwrite: bool,
  ) -> Result<Box<dyn FsOutputStream>>;

  fn mkdirs(&self, conf: &HdfsClientConfig, path: &str) -> Result<bool>;

  fn delete(&self, conf: &HdfsClientConfig, path: &str, recursive: bool) -> Result<bool>;
}

const OP_GETFILESTATUS: &'static str = "GETFILESTATUS";
const OP_LISTSTATUS: &'static str = "LISTSTATUS";
const OP_OPEN: &'static str = "OPEN";
const OP_CREATE: &'static str = "CREATE";
const OP_MKDIRS: &'static str = "MKDIRS";
const OP_DELETE: &'static str = "DELETE";

const USER_NAME_PARAM: &'static str = "user.name";

/// Http clients of one protocol instance. Their timeout bounds connecting, waiting for a
/// response and every single read of a response body, so a slow but steady stream is never cut.
#[derive(Clone)]
struct HttpClients {
  socket_timeout: Duration,
  connect_timeout: Duration,
  name_node: Client,
  data_node: Client,
}

impl HttpClients {
  fn new(endpoint: &Url, conf: &HdfsClientConfig) -> Result<Self> {
    let name_node = Client::builder()
      .timeout(conf.socket_timeout())
      .connect_timeout(conf.connect_timeout())
      .redirect(Policy::none())
      .build()
      .context(ConnectionError(format!("unable to build http client for {}", endpoint)))?;
    let data_node = Client::builder()
      .timeout(conf.socket_timeout())
      .connect_timeout(conf.connect_timeout())
      .build()
      .context(ConnectionError(format!("unable to build http client for {}", endpoint)))?;

    Ok(Self {
      socket_timeout: conf.socket_timeout(),
      connect_timeout: conf.connect_timeout(),
      name_node,
      data_node,
    })
  }

  fn built_for(&self, conf: &HdfsClientConfig) -> bool {
    self.socket_timeout == conf.socket_timeout() && self.connect_timeout == conf.connect_timeout()
  }
}

/// [`ClientProtocol`] over the WebHDFS REST gateway.
///
/// Data operations are two step: the namenode answers with a redirect to a datanode, which is
/// then called with the same method.
#[derive(Clone)]
pub struct WebHdfsProtocol {
  endpoint: Url,
  subject: SubjectRef,
  clients: RefCell<HttpClients>,
}

impl WebHdfsProtocol {
  pub fn new(endpoint: &str, subject: SubjectRef, conf: &HdfsClientConfig) -> Result<Self> {
    let endpoint =
      Url::parse(endpoint).context(InvalidArgumentError(format!("bad endpoint {}", endpoint)))?;
    if endpoint.cannot_be_a_base() {
      return Err(InvalidArgumentError(format!("bad endpoint {}", endpoint)).into());
    }
    let clients = RefCell::new(HttpClients::new(&endpoint, conf)?);
    Ok(Self { endpoint, subject, clients })
  }

  /// Clients matching the timeouts of `conf`; rebuilt after the timeouts were changed.
  fn clients(&self, conf: &HdfsClientConfig) -> Result<HttpClients> {
    let mut clients = self.clients.borrow_mut();
    if !clients.built_for(conf) {
      debug!("Timeouts of {} changed, rebuilding http clients", self.endpoint);
      *clients = HttpClients::new(&self.endpoint, conf)?;
    }
    Ok(clients.clone())
  }

  /// Endpoint url of `path`; every path component is percent encoded as one segment.
  fn url(&self, path: &str) -> Result<Url> {
    let mut url = self.endpoint.clone();
    {
      let mut segments = url
        .path_segments_mut()
        .map_err(|_| InvalidArgumentError(format!("bad endpoint {}", self.endpoint)))?;
      segments.pop_if_empty();

      let mut components = path.split(SEPARATOR).filter(|c| !c.is_empty()).peekable();
      if components.peek().is_none() {
        segments.push("");
      } else {
        segments.extend(components);
      }
    }
    Ok(url)
  }

  fn request(
    &self,
    conf: &HdfsClientConfig,
    method: Method,
    path: &str,
    op: &str,
  ) -> Result<RequestBuilder> {
    Ok(
      self
        .clients(conf)?
        .name_node
        .request(method, self.url(path)?)
        .query(&[("op", op), (USER_NAME_PARAM, self.subject.user().shortname().as_str())]),
    )
  }

  /// Resolves the datanode location of a data operation.
  fn redirect_location(
    &self,
    conf: &HdfsClientConfig,
    request: RequestBuilder,
    path: &str,
  ) -> Result<Option<String>> {
    let response = send(conf, request, path, Some(conf.socket_timeout()))?;
    if response.status() != StatusCode::TEMPORARY_REDIRECT {
      check_status(response, path)?;
      return Ok(None);
    }

    let location = location(&response, path)?;
    debug!("Redirected to {} for {}", location, path);
    Ok(Some(location))
  }
}

fn location(response: &Response, path: &str) -> Result<String> {
  response
    .headers()
    .get(LOCATION)
    .and_then(|l| l.to_str().ok())
    .map(|l| l.to_string())
    .ok_or_else(|| InvalidArgumentError(format!("redirect without location for {}", path)).into())
}

impl ClientProtocol for WebHdfsProtocol {
  fn get_file_info(&self, conf: &HdfsClientConfig, path: &str) -> Result<Option<FileStatus>> {
    let request = self.request(conf, Method::GET, path, OP_GETFILESTATUS)?;
    match send_json::<FileStatusResponse>(conf, request, path) {
      Ok(response) => Ok(Some(response.file_status.into_file_status(path))),
      Err(e) => match e.kind() {
        NotFound(_) => Ok(None),
        _ => Err(e),
      },
    }
  }

  fn get_listing(&self, conf: &HdfsClientConfig, path: &str) -> Result<Vec<FileStatus>> {
    let response: ListStatusResponse =
      send_json(conf, self.request(conf, Method::GET, path, OP_LISTSTATUS)?, path)?;
    Ok(
      response
        .file_statuses
        .file_status
        .into_iter()
        .map(|m| m.into_file_status(path))
        .collect(),
    )
  }

  fn open(&self, conf: &HdfsClientConfig, path: &str) -> Result<Box<dyn FsInputStream>> {
    let request = self
      .request(conf, Method::GET, path, OP_OPEN)?
      .query(&[("buffersize", conf.buffer_size())]);

    // Reads are bounded per call by the client timeout, not by a deadline for the whole body.
    let response = send(conf, request, path, None)?;
    let response = if response.status() == StatusCode::TEMPORARY_REDIRECT {
      let location = location(&response, path)?;
      debug!("Reading {} from {}", path, location);
      let read = self.clients(conf)?.data_node.get(&location);
      check_status(send(conf, read, path, None)?, path)?
    } else {
      check_status(response, path)?
    };

    Ok(Box::new(WebHdfsInputStream { path: path.to_string(), response }))
  }

  fn create(
    &self,
    conf: &HdfsClientConfig,
    path: &str,
    overwrite: bool,
  ) -> Result<Box<dyn FsOutputStream>> {
    Ok(Box::new(WebHdfsOutputStream {
      path: path.to_string(),
      overwrite,
      buffer: Vec::new(),
      protocol: self.clone(),
      conf: conf.clone(),
    }))
  }

  fn mkdirs(&self, conf: &HdfsClientConfig, path: &str) -> Result<bool> {
    let response: BooleanResponse =
      send_json(conf, self.request(conf, Method::PUT, path, OP_MKDIRS)?, path)?;
    Ok(response.boolean)
  }

  fn delete(&self, conf: &HdfsClientConfig, path: &str, recursive: bool) -> Result<bool> {
    let request =
      self.request(conf, Method::DELETE, path, OP_DELETE)?.query(&[("recursive", recursive)]);
    let response: BooleanResponse = send_json(conf, request, path)?;
    Ok(response.boolean)
  }
}

/// Sends the request, retrying connect timeouts up to the configured count. A `deadline` bounds
/// the whole exchange including the response body; without one only the client timeout applies.
fn send(
  conf: &HdfsClientConfig,
  request: RequestBuilder,
  path: &str,
  deadline: Option<Duration>,
) -> Result<Response> {
  let mut attempt = 0;
  loop {
    let mut attempt_request = request
      .try_clone()
      .ok_or_else(|| InvalidArgumentError(format!("request for {} can not be retried", path)))?;
    if let Some(deadline) = deadline {
      attempt_request = attempt_request.timeout(deadline);
    }

    match attempt_request.send() {
      Ok(response) => return Ok(response),
      Err(e) if e.is_connect() && e.is_timeout() && attempt < conf.max_retries_on_timeout() => {
        attempt += 1;
        warn!("Connect timeout for {}, retry {} of {}", path, attempt, conf.max_retries_on_timeout());
      }
      Err(e) if e.is_timeout() => {
        return Err(e.context(TimeOutError(conf.socket_timeout())).into());
      }
      Err(e) => {
        return Err(e.context(ConnectionError(format!("request for {} failed", path))).into());
      }
    }
  }
}

/// Passes successful responses through and turns the rest into typed errors.
fn check_status(response: Response, path: &str) -> Result<Response> {
  let status = response.status();
  if status.is_success() {
    return Ok(response);
  }

  if status == StatusCode::UNAUTHORIZED {
    return Err(
      AuthenticationError(format!(
        "gateway rejected the request for {} with {}; SPNEGO is not supported",
        path, status
      ))
      .into(),
    );
  }

  let body = response.text().unwrap_or_default();
  match serde_json::from_str::<RemoteExceptionResponse>(&body) {
    Ok(remote) => Err(HdfsClientError::from(remote.remote_exception)),
    Err(_) if status == StatusCode::NOT_FOUND => Err(NotFound(path.to_string()).into()),
    Err(_) => Err(IoError(format!("unexpected response {} for {}: {}", status, path, body)).into()),
  }
}

fn send_json<T: DeserializeOwned>(
  conf: &HdfsClientConfig,
  request: RequestBuilder,
  path: &str,
) -> Result<T> {
  let response = check_status(send(conf, request, path, Some(conf.socket_timeout()))?, path)?;
  Ok(response.json::<T>().context(IoError(format!("malformed response for {}", path)))?)
}

struct WebHdfsInputStream {
  path: String,
  response: Response,
}

impl Read for WebHdfsInputStream {
  fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
    self.response.read(buf)
  }
}

impl FsInputStream for WebHdfsInputStream {
  fn path(&self) -> &str {
    &self.path
  }
}

/// Collects the written bytes and uploads them on close.
struct WebHdfsOutputStream {
  path: String,
  overwrite: bool,
  buffer: Vec<u8>,
  protocol: WebHdfsProtocol,
  conf: HdfsClientConfig,
}

impl Write for WebHdfsOutputStream {
  fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
    self.buffer.extend_from_slice(buf);
    Ok(buf.len())
  }

  fn flush(&mut self) -> io::Result<()> {
    Ok(())
  }
}

impl FsOutputStream for WebHdfsOutputStream {
  fn path(&self) -> &str {
    &self.path
  }

  fn close(self: Box<Self>) -> Result<()> {
    let WebHdfsOutputStream { path, overwrite, buffer, protocol, conf } = *self;
    let request =
      protocol.request(&conf, Method::PUT, &path, OP_CREATE)?.query(&[("overwrite", overwrite)]);

    match protocol.redirect_location(&conf, request, &path)? {
      Some(location) => {
        // One socket timeout per buffer of data, like a per packet write timeout.
        let buffers = 1 + buffer.len() / conf.buffer_size().max(1);
        let deadline = conf.socket_timeout() * buffers as u32;
        let upload = protocol
          .clients(&conf)?
          .data_node
          .put(&location)
          .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
          .body(buffer);
        check_status(send(&conf, upload, &path, Some(deadline))?, &path)?;
      }
      None if buffer.is_empty() => debug!("Gateway created empty {} without a redirect", path),
      None => {
        return Err(
          IoError(format!(
            "gateway created {} without a datanode location, {} bytes were not written",
            path,
            buffer.len()
          ))
          .into(),
        )
      }
    }
    debug!("Uploaded {}", path);
    Ok(())
  }
}
