use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use futures::StreamExt;

use crate::manifest::PlaylistFetcher;
use crate::progress::TranscoderKind;
use crate::prompt::Prompter;
use crate::toolchain::{MediaToolchain, TranscoderOutput};
use crate::{EngineError, Result};

/// Routes engine logs to the test harness output.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Prompter that replays canned answers and records what was shown.
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<String>>,
    shown: Mutex<Vec<String>>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
            shown: Mutex::new(Vec::new()),
            asked: Mutex::new(Vec::new()),
        }
    }

    pub fn shown(&self) -> Vec<String> {
        self.shown.lock().unwrap().clone()
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }
}

impl Prompter for ScriptedPrompter {
    fn show(&self, line: &str) {
        self.shown.lock().unwrap().push(line.to_string());
    }

    fn ask(&self, question: &str) -> Result<String> {
        self.asked.lock().unwrap().push(question.to_string());
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| EngineError::Prompt("no scripted answer left".to_string()))
    }
}

/// Toolchain that replays a canned transcoder output and, like a real
/// transcoder, creates the output file.
pub struct FakeToolchain {
    duration: Option<f64>,
    lines: Vec<String>,
    write_output: bool,
    transcodes: Mutex<Vec<(String, PathBuf)>>,
    probes: Mutex<Vec<String>>,
}

impl FakeToolchain {
    pub fn new<I, S>(duration: Option<f64>, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            duration,
            lines: lines.into_iter().map(Into::into).collect(),
            write_output: true,
            transcodes: Mutex::new(Vec::new()),
            probes: Mutex::new(Vec::new()),
        }
    }

    pub fn without_output(mut self) -> Self {
        self.write_output = false;
        self
    }

    pub fn transcodes(&self) -> Vec<(String, PathBuf)> {
        self.transcodes.lock().unwrap().clone()
    }

    pub fn probes(&self) -> Vec<String> {
        self.probes.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaToolchain for FakeToolchain {
    fn kind(&self) -> TranscoderKind {
        TranscoderKind::Ffmpeg
    }

    async fn probe_duration(&self, url: &str) -> Result<Option<f64>> {
        self.probes.lock().unwrap().push(url.to_string());
        Ok(self.duration)
    }

    async fn transcode(&self, url: &str, _params: &[&str], output: &Path) -> Result<TranscoderOutput> {
        self.transcodes
            .lock()
            .unwrap()
            .push((url.to_string(), output.to_path_buf()));
        if self.write_output {
            tokio::fs::write(output, b"media").await?;
        }
        Ok(futures::stream::iter(self.lines.clone()).boxed())
    }

    async fn convert_subtitles(&self, markup: &str) -> Result<String> {
        Ok(markup.to_uppercase())
    }
}

/// Playlist fetcher serving fixed bodies by URL.
#[derive(Default)]
pub struct FakeFetcher {
    bodies: HashMap<String, String>,
}

impl FakeFetcher {
    pub fn with(mut self, url: &str, body: &str) -> Self {
        self.bodies.insert(url.to_string(), body.to_string());
        self
    }
}

#[async_trait]
impl PlaylistFetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        self.bodies
            .get(url)
            .cloned()
            .ok_or_else(|| EngineError::Playlist(format!("no body for {url}")))
    }
}
