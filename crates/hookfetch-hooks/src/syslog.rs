//! Report every dispatch to a remote syslog collector over UDP.
//!
//! One RFC 5424 datagram per dispatch, sent from the postreq listener:
//!
//! ```text
//! <134>1 2026-10-17T09:30:00.000Z host app 4242 fetch - \u{feff}200 GET https://example.com/ ms=12 len=5
//! ```
//!
//! The message is the status (`-` on error), the method, the elided URL, the
//! time since the prereq listener ran and the body length when it is known.

use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use hookfetch::http::Method;
use hookfetch::{Error, Hook, HookResult, Listeners, Request, Response, Url};
use serde::Deserialize;
use sysinfo::System;
use tracing::debug;

use crate::error::{HookError, Result};

const NILVALUE: &str = "-";
const MSGID: &str = "fetch";
const BOM: &str = "\u{feff}";

/// Syslog severities the hook uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error   = 3,
    Warning = 4,
    Info    = 6,
}

impl Severity {
    /// Errors are errors, statuses below 400 are info, the rest warnings.
    pub fn of(response: Option<&Response>, err: Option<&Error>) -> Self {
        match (response, err) {
            (_, Some(_)) | (None, None) => Severity::Error,
            (Some(response), None) if response.status().as_u16() < 400 => Severity::Info,
            (Some(_), None) => Severity::Warning,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SyslogOptions {
    /// Default: "127.0.0.1"
    pub target_host: String,

    /// Default: 514
    pub target_port: u16,

    /// Default: the executable's file name
    pub appname: Option<String>,

    /// Default: the system host name
    pub hostname: Option<String>,

    /// Default: 16 (local0)
    pub facility: u8,
}

impl Default for SyslogOptions {
    fn default() -> Self {
        Self {
            target_host: "127.0.0.1".to_owned(),
            target_port: 514,
            appname:     None,
            hostname:    None,
            facility:    16,
        }
    }
}

/// How URLs are shortened before they are logged.
pub type Elide = fn(&Url) -> String;

/// Observes every dispatch and sends one datagram about it.
#[derive(Debug, Clone)]
pub struct SyslogHook {
    sender: Arc<Sender>,
    elide:  Elide,
}

#[derive(Debug)]
struct Sender {
    socket:   UdpSocket,
    target:   SocketAddr,
    facility: u8,
    hostname: String,
    appname:  String,
    pid:      u32,
}

impl SyslogHook {
    /// Resolve the target and bind a local UDP socket for it.
    ///
    /// The socket is a plain std one: a UDP send only hands the datagram to
    /// the kernel, so listeners can send synchronously.
    pub async fn connect(options: SyslogOptions) -> Result<Self> {
        let target_name = format!("{}:{}", options.target_host, options.target_port);
        let mut addrs = tokio::net::lookup_host(target_name.as_str()).await?;
        let target = addrs
            .next()
            .ok_or_else(|| HookError::SyslogTarget(target_name.clone()))?;
        let local = if target.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(local)?;

        let sender = Sender {
            socket,
            target,
            facility: options.facility,
            hostname: options.hostname.or_else(System::host_name).unwrap_or_else(|| NILVALUE.to_owned()),
            appname: options.appname.unwrap_or_else(default_appname),
            pid: std::process::id(),
        };
        debug!(peer = %sender.target, appname = %sender.appname, "syslog hook connected");

        Ok(Self {
            sender: Arc::new(sender),
            elide:  remove_auth_and_query,
        })
    }

    /// Replace the default [`remove_auth_and_query`].
    pub fn with_elide(mut self, elide: Elide) -> Self {
        self.elide = elide;
        self
    }
}

#[async_trait]
impl Hook for SyslogHook {
    fn name(&self) -> &str { "syslog" }

    async fn call(&self, _: &Request) -> hookfetch::Result<Option<HookResult>> {
        let started: Arc<Mutex<Option<DateTime<Utc>>>> = Arc::default();
        let sender = Arc::clone(&self.sender);
        let elide = self.elide;

        let listeners = Listeners::new()
            .prereq({
                let started = Arc::clone(&started);
                move |_, at| {
                    if let Ok(mut slot) = started.lock() {
                        *slot = Some(at);
                    }
                    Ok(())
                }
            })
            .postreq(move |request, response, err| {
                let started = started.lock().ok().and_then(|slot| *slot);
                let message = format_message(request, response, err, started, Utc::now(), elide);
                let datagram = sender.datagram(Severity::of(response, err), started, &message);
                sender.send(&datagram)?;
                Ok(())
            });
        Ok(Some(HookResult::observe(listeners)))
    }
}

impl Sender {
    /// A full send buffer drops the datagram rather than failing the
    /// listener.
    fn send(&self, datagram: &str) -> io::Result<()> {
        match self.socket.send_to(datagram.as_bytes(), self.target) {
            Ok(_) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                debug!(peer = %self.target, "syslog datagram dropped: send buffer full");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    fn datagram(&self, severity: Severity, timestamp: Option<DateTime<Utc>>, message: &str) -> String {
        let pri = u16::from(self.facility) * 8 + severity as u16;
        let timestamp = timestamp
            .unwrap_or_else(Utc::now)
            .to_rfc3339_opts(SecondsFormat::Millis, true);
        format!(
            "<{pri}>1 {timestamp} {} {} {} {MSGID} {NILVALUE} {BOM}{message}",
            self.hostname, self.appname, self.pid
        )
    }
}

/// The free-form part of the datagram.
pub fn format_message(
    request: &Request,
    response: Option<&Response>,
    err: Option<&Error>,
    started: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    elide: Elide,
) -> String {
    let status = match (response, err) {
        (Some(response), None) => response.status().as_str().to_owned(),
        _ => NILVALUE.to_owned(),
    };
    let mut parts = vec![status, request.method().as_str().to_uppercase(), elide(request.url())];
    if let Some(started) = started {
        parts.push(format!("ms={}", (now - started).num_milliseconds().max(0)));
    }
    if let Some(len) = content_length(request, response) {
        parts.push(format!("len={len}"));
    }
    parts.join(" ")
}

/// `content-length` when present, else the exact body size when known; HEAD
/// responses without either count as empty.
fn content_length(request: &Request, response: Option<&Response>) -> Option<u64> {
    let response = response?;
    response
        .content_length()
        .or_else(|| response.body().size_hint())
        .or_else(|| (*request.method() == Method::HEAD).then_some(0))
}

/// Drop credentials, query and fragment; `data:` URIs collapse to
/// `data:...`.
pub fn remove_auth_and_query(url: &Url) -> String {
    if url.scheme() == "data" {
        return "data:...".to_owned();
    }
    let mut url = url.clone();
    // only fails for URLs that cannot carry credentials in the first place
    let _ = url.set_username("");
    let _ = url.set_password(None);
    url.set_query(None);
    url.set_fragment(None);
    url.into()
}

fn default_appname() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.file_stem().map(|stem| stem.to_string_lossy().into_owned()))
        .unwrap_or_else(|| NILVALUE.to_owned())
}
