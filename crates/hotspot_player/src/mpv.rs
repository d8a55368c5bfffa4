use crate::config::PlayerConfig;
use crate::error::{PlayerError, Result};
use hotspot_core::{TimeUs, VideoSource};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

/// Properties mpv pushes to us; the reply id is the index plus one.
const OBSERVED: [&str; 3] = ["time-pos", "duration", "pause"];

/// Last values mpv reported, plus our own optimistic updates.
#[derive(Debug, Clone, PartialEq)]
struct Observed {
    time_pos: Option<TimeUs>,
    duration: Option<TimeUs>,
    paused: bool,
}

impl Default for Observed {
    fn default() -> Self {
        // mpv is started with --pause=yes.
        Self {
            time_pos: None,
            duration: None,
            paused: true,
        }
    }
}

/// A video source backed by an mpv process, driven over its JSON IPC socket.
///
/// Socket traffic runs on its own task. The [`VideoSource`] methods only
/// read the property cache or queue a command, so the driver loop never
/// waits on mpv.
pub struct MpvVideoSource {
    process: Option<Child>,
    socket_path: PathBuf,
    requests: mpsc::UnboundedSender<Value>,
    observed: Arc<Mutex<Observed>>,
    ipc: JoinHandle<()>,
}

impl MpvVideoSource {
    /// Start mpv idle and connect to its IPC socket.
    pub async fn spawn(config: &PlayerConfig) -> Result<Self> {
        let socket_path =
            std::env::temp_dir().join(format!("hotspot-mpv-{}", std::process::id()));
        let _ = tokio::fs::remove_file(&socket_path).await;

        let log_path =
            std::env::temp_dir().join(format!("hotspot-mpv-{}.log", std::process::id()));
        let log_file = std::fs::File::create(&log_path).ok();
        info!(binary = %config.mpv_binary, log = %log_path.display(), "starting mpv");

        let mut child = Command::new(&config.mpv_binary)
            .args([
                "--idle=yes",
                "--keep-open=yes",
                "--pause=yes",
                "--osc=no",
                "--title=hotspot-player",
                &format!("--input-ipc-server={}", socket_path.display()),
            ])
            .args(&config.extra_args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(log_file.map(Stdio::from).unwrap_or(Stdio::null()))
            .kill_on_drop(true)
            .spawn()
            .map_err(PlayerError::Spawn)?;

        let deadline = Instant::now() + config.socket_wait();
        while !tokio::fs::try_exists(&socket_path).await.unwrap_or(false) {
            if Instant::now() >= deadline {
                let _ = child.kill().await;
                return Err(PlayerError::SocketTimeout(socket_path));
            }
            sleep(Duration::from_millis(100)).await;
        }

        let stream = match timeout(config.ipc_timeout(), UnixStream::connect(&socket_path)).await {
            Ok(stream) => stream?,
            Err(_) => {
                let _ = child.kill().await;
                return Err(PlayerError::Ipc("timed out connecting to mpv".into()));
            }
        };

        let mut source = Self::from_stream(stream, socket_path, config.ipc_timeout())?;
        source.process = Some(child);
        Ok(source)
    }

    fn from_stream(stream: UnixStream, socket_path: PathBuf, write_timeout: Duration) -> Result<Self> {
        let observed = Arc::new(Mutex::new(Observed::default()));
        let (requests, pending) = mpsc::unbounded_channel();
        let ipc = tokio::spawn(run_ipc(stream, pending, Arc::clone(&observed), write_timeout));

        let source = Self {
            process: None,
            socket_path,
            requests,
            observed,
            ipc,
        };
        for (id, name) in OBSERVED.iter().enumerate() {
            source.send(json!({ "command": ["observe_property", id + 1, name] }))?;
        }
        Ok(source)
    }

    fn send(&self, command: Value) -> Result<()> {
        self.requests
            .send(command)
            .map_err(|_| PlayerError::Ipc("IPC task has stopped".into()))
    }

    fn observed(&self) -> MutexGuard<'_, Observed> {
        lock(&self.observed)
    }

    fn set_paused(&self, paused: bool) -> Result<()> {
        self.send(json!({ "command": ["set_property", "pause", paused] }))?;
        self.observed().paused = paused;
        Ok(())
    }

    pub fn load_file(&mut self, path: &str) -> Result<()> {
        info!(path, "loading file into mpv");
        {
            let mut observed = self.observed();
            observed.time_pos = None;
            observed.duration = None;
        }
        self.send(json!({ "command": ["loadfile", path] }))
    }

    pub async fn stop(&mut self) {
        self.ipc.abort();
        if let Some(mut child) = self.process.take() {
            debug!("stopping mpv");
            let _ = child.kill().await;
        }
        let _ = tokio::fs::remove_file(&self.socket_path).await;
    }
}

impl VideoSource for MpvVideoSource {
    fn current_time(&self) -> hotspot_core::Result<TimeUs> {
        match self.observed().time_pos {
            Some(t) => Ok(t),
            None => Err(PlayerError::NoProperty("time-pos").into()),
        }
    }

    fn duration(&self) -> Option<TimeUs> {
        self.observed().duration
    }

    fn seek(&mut self, to: TimeUs) -> hotspot_core::Result<()> {
        self.send(json!({ "command": ["seek", to.as_seconds(), "absolute"] }))?;
        self.observed().time_pos = Some(to);
        Ok(())
    }

    fn play(&mut self) -> hotspot_core::Result<()> {
        self.set_paused(false).map_err(|e| {
            warn!(error = %e, "mpv refused to play");
            e.into()
        })
    }

    fn pause(&mut self) -> hotspot_core::Result<()> {
        Ok(self.set_paused(true)?)
    }

    fn is_playing(&self) -> hotspot_core::Result<bool> {
        Ok(!self.observed().paused)
    }
}

impl Drop for MpvVideoSource {
    fn drop(&mut self) {
        self.ipc.abort();
        if let Some(child) = self.process.as_mut() {
            let _ = child.start_kill();
        }
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

fn lock(observed: &Mutex<Observed>) -> MutexGuard<'_, Observed> {
    observed.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn run_ipc(
    stream: UnixStream,
    mut requests: mpsc::UnboundedReceiver<Value>,
    observed: Arc<Mutex<Observed>>,
    write_timeout: Duration,
) {
    let (read, mut write) = stream.into_split();
    let mut lines = BufReader::new(read).lines();

    loop {
        tokio::select! {
            request = requests.recv() => {
                let Some(request) = request else { break };
                let line = format!("{request}\n");
                match timeout(write_timeout, write.write_all(line.as_bytes())).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        warn!(error = %e, "mpv IPC write failed");
                        break;
                    }
                    Err(_) => {
                        warn!(%request, "mpv IPC write timed out");
                        break;
                    }
                }
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) => match serde_json::from_str::<Value>(&line) {
                    Ok(message) => handle_message(&mut lock(&observed), &message),
                    Err(e) => debug!(error = %e, %line, "unparseable mpv message"),
                },
                Ok(None) => {
                    info!("mpv closed its IPC socket");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "mpv IPC read failed");
                    break;
                }
            },
        }
    }
}

/// Fold one line from mpv into the cache. Replies and events share the
/// socket; only property changes carry state.
fn handle_message(observed: &mut Observed, message: &Value) {
    if let Some(event) = message.get("event").and_then(Value::as_str) {
        if event == "property-change" {
            if let Some(name) = message.get("name").and_then(Value::as_str) {
                apply_property(observed, name, message.get("data"));
            }
        }
        return;
    }
    match message.get("error").and_then(Value::as_str) {
        Some("success") | None => {}
        Some(err) => warn!(error = err, "mpv rejected a command"),
    }
}

fn apply_property(observed: &mut Observed, name: &str, data: Option<&Value>) {
    let seconds = data
        .and_then(Value::as_f64)
        .and_then(|s| TimeUs::try_from_seconds(s).ok());
    match name {
        "time-pos" => observed.time_pos = seconds,
        "duration" => observed.duration = seconds.filter(|d| *d > TimeUs::ZERO),
        "pause" => {
            if let Some(paused) = data.and_then(Value::as_bool) {
                observed.paused = paused;
            }
        }
        _ => {}
    }
}
