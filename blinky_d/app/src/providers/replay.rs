use anyhow::{Context, Result};
use api::{FaceFrame, LandmarkProvider, ProviderLogger};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

/// Parses JSON Lines; blank lines and `#` comments are skipped.
pub fn parse_frames<R: BufRead>(reader: R) -> Result<Vec<FaceFrame>> {
    let mut frames = Vec::new();
    for (number, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read replay line")?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let frame = serde_json::from_str(line)
            .with_context(|| format!("Invalid frame on line {}", number + 1))?;
        frames.push(frame);
    }
    Ok(frames)
}

/// Plays back a recorded session, one frame per call.
pub struct ReplayProvider {
    path: PathBuf,
    looped: bool,
    frames: Vec<FaceFrame>,
    cursor: usize,
    logger: Option<ProviderLogger>,
}

impl ReplayProvider {
    pub fn new(path: PathBuf, looped: bool) -> Self {
        Self {
            path,
            looped,
            frames: Vec::new(),
            cursor: 0,
            logger: None,
        }
    }

    pub fn from_frames(frames: Vec<FaceFrame>, looped: bool) -> Self {
        Self {
            path: PathBuf::new(),
            looped,
            frames,
            cursor: 0,
            logger: None,
        }
    }
}

impl LandmarkProvider for ReplayProvider {
    fn initialize(&mut self, logger: ProviderLogger) -> Result<()> {
        if self.frames.is_empty() {
            let file = File::open(&self.path)
                .with_context(|| format!("Failed to open replay file {:?}", self.path))?;
            self.frames = parse_frames(BufReader::new(file))?;
        }
        if self.frames.is_empty() {
            anyhow::bail!("Replay file {:?} contains no frames", self.path);
        }
        logger.info(&format!(
            "Replaying {} frames{}",
            self.frames.len(),
            if self.looped { " in a loop" } else { "" }
        ));
        self.logger = Some(logger);
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<FaceFrame>> {
        if self.cursor >= self.frames.len() {
            if !self.looped {
                anyhow::bail!("Replay finished after {} frames", self.frames.len());
            }
            if let Some(logger) = &self.logger {
                logger.debug("Replay wrapped around");
            }
            self.cursor = 0;
        }
        let frame = self.frames[self.cursor].clone();
        self.cursor += 1;
        Ok(Some(frame))
    }

    fn unload(&mut self) {
        if let Some(logger) = &self.logger {
            logger.info(&format!("Replay stopped at frame {}", self.cursor));
        }
        self.frames.clear();
    }
}
