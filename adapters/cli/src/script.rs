//! Scripted per-frame input.
//!
//! One line per frame, each holding whitespace separated input names. Blank
//! lines are frames without input and everything after `#` is ignored.
//! Frames past the end of the script receive no input.

use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use tilestrike_core::FrameInput;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct InputScript {
    frames: Vec<FrameInput>,
}

impl InputScript {
    pub(crate) fn from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read input script at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("invalid input script {}", path.display()))
    }

    pub(crate) fn parse(contents: &str) -> Result<Self> {
        let mut frames = Vec::new();
        for (index, line) in contents.lines().enumerate() {
            let line = line.split('#').next().unwrap_or_default();
            let mut input = FrameInput::default();
            for name in line.split_whitespace() {
                let Some(flag) = flag_for(&mut input, name) else {
                    bail!("unknown input `{name}` on line {}", index + 1);
                };
                *flag = true;
            }
            frames.push(input);
        }
        Ok(Self { frames })
    }

    pub(crate) fn frame(&self, index: usize) -> FrameInput {
        self.frames.get(index).copied().unwrap_or_default()
    }
}

fn flag_for<'a>(input: &'a mut FrameInput, name: &str) -> Option<&'a mut bool> {
    let flag = match name {
        "left" => &mut input.move_left,
        "right" => &mut input.move_right,
        "up" => &mut input.move_up,
        "down" => &mut input.move_down,
        "slash" => &mut input.slash,
        "lunge" => &mut input.lunge,
        "smash" => &mut input.smash,
        "rotl" => &mut input.rotate_left,
        "rotr" => &mut input.rotate_right,
        "cycle" => &mut input.cycle_sticker,
        "place" => &mut input.place_sticker,
        "debug" => &mut input.debug_toggle,
        _ => return None,
    };
    Some(flag)
}
