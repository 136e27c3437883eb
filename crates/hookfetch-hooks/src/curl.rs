use std::io::{self, Write};
use std::sync::Mutex;

use async_trait::async_trait;
use hookfetch::{Hook, HookResult, Request};
use tracing::warn;

/// Writes every request as an equivalent `curl` command line, stderr by
/// default. Never has an opinion.
///
/// The write is synchronous and happens on the dispatching task. This is a
/// debugging aid; give it a fast writer.
pub struct CurlHook {
    out: Mutex<Box<dyn Write + Send>>,
}

impl CurlHook {
    pub fn new() -> Self { Self::with_writer(io::stderr()) }

    pub fn with_writer(out: impl Write + Send + 'static) -> Self {
        Self {
            out: Mutex::new(Box::new(out)),
        }
    }
}

impl Default for CurlHook {
    fn default() -> Self { Self::new() }
}

#[async_trait]
impl Hook for CurlHook {
    fn name(&self) -> &str { "curl" }

    async fn call(&self, request: &Request) -> hookfetch::Result<Option<HookResult>> {
        let command = curl_command(request);
        let written = match self.out.lock() {
            Ok(mut out) => writeln!(out, "{command}").and_then(|()| out.flush()),
            Err(_) => Err(io::Error::other("curl output lock poisoned")),
        };
        if let Err(err) = written {
            warn!(error = %err, "failed to write curl command");
        }
        Ok(None)
    }
}

/// Render `request` as a `curl` invocation, one option per line.
///
/// Requests whose method carries a body read it from `/tmp/input`.
pub fn curl_command(request: &Request) -> String {
    let mut command = "curl";
    let mut blocks = vec![
        quote(request.url().as_str()),
        "-D -".to_owned(),
        format!("-X {}", request.method()),
    ];
    for (name, value) in request.headers() {
        blocks.push(format!("-H {}", quote(&format!("{}: {}", name, String::from_utf8_lossy(value.as_bytes())))));
    }
    if request.body_matters() {
        command = "cat /tmp/input | curl";
        blocks.push("--data-binary @-".to_owned());
    }
    format!("{command} \\\n    {}", blocks.join(" \\\n    "))
}

/// Single-quote `s` for a POSIX shell.
fn quote(s: &str) -> String { format!("'{}'", s.replace('\'', r"'\''")) }
