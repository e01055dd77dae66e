use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use device_checkup_core::model::{
    DeviceOutcome, KeyboardOutcome, ScreenOutcome, SpeakerOutcome, TrackpadOutcome,
};
use device_checkup_core::{InteractiveOutcome, StepId};

/// Keys on a standard laptop layout.
pub const KEYBOARD_KEYS: u32 = 78;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
    Skip,
}

pub fn parse_answer(input: &str) -> Option<Answer> {
    match input.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Some(Answer::Yes),
        "n" | "no" => Some(Answer::No),
        "s" | "skip" => Some(Answer::Skip),
        _ => None,
    }
}

/// What the operator decided for an interactive step.
#[derive(Debug, Clone, PartialEq)]
pub enum StepReply {
    Outcome(InteractiveOutcome),
    Skip,
}

/// Terminal harness for the interactive steps.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn ask(&mut self, step: StepId) -> Result<StepReply> {
        let reply = match step {
            StepId::Screen => self
                .question("Cycle the screen through solid colors. Any dead or stuck pixels?")?
                .map(|dead_pixel| {
                    InteractiveOutcome::Screen(ScreenOutcome { dead_pixel })
                }),
            StepId::Keyboard => match self.question(&format!(
                "Press every key. Did all {KEYBOARD_KEYS} keys register?"
            ))? {
                None => None,
                Some(true) => Some(InteractiveOutcome::Keyboard(KeyboardOutcome {
                    tested_keys: KEYBOARD_KEYS,
                    total_keys: KEYBOARD_KEYS,
                })),
                Some(false) => {
                    // "No" means at least one key failed to register.
                    let tested_keys =
                        self.count("How many keys registered?", KEYBOARD_KEYS - 1)?;
                    Some(InteractiveOutcome::Keyboard(KeyboardOutcome {
                        tested_keys,
                        total_keys: KEYBOARD_KEYS,
                    }))
                }
            },
            StepId::Trackpad => match self.question("Trackpad: does click work?")? {
                None => None,
                Some(click) => {
                    let drag = self.confirm("Trackpad: does drag work?")?;
                    let gesture = self.confirm("Trackpad: do two-finger gestures work?")?;
                    Some(InteractiveOutcome::Trackpad(TrackpadOutcome {
                        click,
                        drag,
                        gesture,
                    }))
                }
            },
            StepId::Camera => self
                .question("Open the camera. Is the picture clear?")?
                .map(|working| InteractiveOutcome::Camera(DeviceOutcome { working })),
            StepId::Microphone => self
                .question("Record a short clip. Does playback pick up your voice?")?
                .map(|working| InteractiveOutcome::Microphone(DeviceOutcome { working })),
            StepId::Speaker => match self.question("Play the left channel. Did you hear it?")? {
                None => None,
                Some(left) => {
                    let right = self.confirm("Play the right channel. Did you hear it?")?;
                    Some(InteractiveOutcome::Speaker(SpeakerOutcome { left, right }))
                }
            },
            other => anyhow::bail!("{other} is not an interactive step"),
        };
        Ok(reply.map_or(StepReply::Skip, StepReply::Outcome))
    }

    /// `None` means the operator skipped the step.
    fn question(&mut self, text: &str) -> Result<Option<bool>> {
        loop {
            match self.read_answer(&format!("{text} [y/n/s] "))? {
                Some(Answer::Yes) => return Ok(Some(true)),
                Some(Answer::No) => return Ok(Some(false)),
                Some(Answer::Skip) => return Ok(None),
                None => writeln!(self.output, "Please answer y, n or s.")?,
            }
        }
    }

    /// Follow-up question inside a step that is already under way.
    fn confirm(&mut self, text: &str) -> Result<bool> {
        loop {
            match self.read_answer(&format!("{text} [y/n] "))? {
                Some(Answer::Yes) => return Ok(true),
                Some(Answer::No) => return Ok(false),
                _ => writeln!(self.output, "Please answer y or n.")?,
            }
        }
    }

    fn count(&mut self, text: &str, max: u32) -> Result<u32> {
        loop {
            let line = self.read_line(&format!("{text} [0-{max}] "))?;
            match line.trim().parse::<u32>() {
                Ok(value) if value <= max => return Ok(value),
                _ => writeln!(self.output, "Please enter a number between 0 and {max}.")?,
            }
        }
    }

    fn read_answer(&mut self, prompt: &str) -> Result<Option<Answer>> {
        let line = self.read_line(prompt)?;
        Ok(parse_answer(&line))
    }

    fn read_line(&mut self, prompt: &str) -> Result<String> {
        write!(self.output, "{prompt}")?;
        self.output.flush().context("failed to flush prompt")?;
        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .context("failed to read answer")?;
        if read == 0 {
            anyhow::bail!("input closed before the interactive steps finished");
        }
        Ok(line)
    }
}
