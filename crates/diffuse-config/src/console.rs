//! Text command syntax.
//!
//! Parses one whitespace-separated console line into a [`Command`]. The
//! vocabulary mirrors the engine's message names:
//!
//! ```text
//! state new 8                      state save 0 front protect
//! state set 0 1.0 0.5              state load front 3
//! ramp_to 0 3 500 ramp             ramp_between 0 1 2 0.25 800 xfade
//! ramp_max 0 1 0.5 2 1.0 300 ramp  circular 0 4 1 0.5 2000
//! velocity all 2                   freeze 1 1
//! channel on all                   channel set 0 0.2 0.8
//! set ramp sigmoid 3               output db
//! ```
//!
//! Only syntax is checked here. Ranges and indices are validated by the
//! engine when the command is applied.

use diffuse_core::{Command, CurveFamily, CurveShape, MeterMode, Protection};
use std::str::FromStr;

use crate::error::ConfigError;

/// Parses a console line.
pub fn parse_command(line: &str) -> Result<Command, ConfigError> {
    let mut args = Args::new(line);
    let head = args.word("command")?;
    let command = match head {
        "state" => parse_state(&mut args)?,
        "channel" => parse_channel(&mut args)?,
        "ramp_to" => Command::RampTo {
            channel: args.index("channel")?,
            slot: args.index("state")?,
            duration_ms: args.float("time in ms")?,
            family: args.parse("ramp or xfade")?,
        },
        "ramp_between" => Command::RampBetween {
            channel: args.index("channel")?,
            from: args.index("state")?,
            to: args.index("state")?,
            t: args.float("interpolation")?,
            duration_ms: args.float("time in ms")?,
            family: args.parse("ramp or xfade")?,
        },
        "ramp_max" => parse_ramp_max(&mut args)?,
        "circular" => Command::Circular {
            first: args.index("channel")?,
            count: args.index("channel count")?,
            slot: args.index("state")?,
            rotation: args.float("rotation")?,
            duration_ms: args.float("time in ms")?,
        },
        "velocity" => Command::Velocity {
            channel: args.target("channel")?,
            value: args.float("velocity")?,
        },
        "velocity_all" => Command::Velocity {
            channel: None,
            value: args.float("velocity")?,
        },
        "freeze" => Command::Freeze {
            channel: args.target("channel")?,
            frozen: args.flag("0 or 1")?,
        },
        "freeze_all" => Command::Freeze {
            channel: None,
            frozen: args.flag("0 or 1")?,
        },
        "gain_in" => Command::GainIn {
            channel: args.index("channel")?,
            gain: args.float("gain")?,
        },
        "gain_out" => Command::GainOut {
            output: args.index("output")?,
            gain: args.float("gain")?,
        },
        "master" => Command::Master {
            gain: args.float("gain")?,
        },
        "mute_ramp" => Command::MuteRamp {
            channel: args.index("channel")?,
            muted: args.flag("0 or 1")?,
        },
        "output" => Command::Meter {
            mode: args.parse::<MeterMode>("off, db or ampl")?,
        },
        "set" => parse_curve(&mut args)?,
        "get" => Command::Info,
        other => return Err(args.error(format!("unknown command '{other}'"))),
    };
    args.finish()?;
    Ok(command)
}

fn parse_state(args: &mut Args<'_>) -> Result<Command, ConfigError> {
    let command = match args.word("state command")? {
        "new" => Command::New {
            count: args.index("state count")?,
        },
        "free" => Command::Free,
        "resize" => Command::Resize {
            count: args.index("state count")?,
        },
        "set" => Command::Set {
            slot: args.index("state")?,
            gains: args.rest_floats("gain")?,
        },
        "name" => Command::Name {
            slot: args.index("state")?,
            name: args.word("state name")?.to_string(),
        },
        "get" => Command::Get {
            slot: args.index("state")?,
        },
        "post" => Command::Post {
            slot: args.optional_target("state")?,
        },
        "store" => Command::Store {
            channel: args.index("channel")?,
            slot: args.index("state")?,
            name: args.word("state name")?.to_string(),
        },
        "save" => Command::Save {
            slot: args.index("state")?,
            name: args.word("state name")?.to_string(),
            protection: args.protection()?,
        },
        "load" => Command::Load {
            name: args.word("state name")?.to_string(),
            slot: args.index("state")?,
        },
        "delete" => Command::Delete {
            name: args.word("state name")?.to_string(),
            protection: args.override_only()?,
        },
        "rename" => Command::Rename {
            from: args.word("state name")?.to_string(),
            to: args.word("state name")?.to_string(),
            protection: args.override_only()?,
        },
        other => return Err(args.error(format!("unknown state command '{other}'"))),
    };
    Ok(command)
}

fn parse_channel(args: &mut Args<'_>) -> Result<Command, ConfigError> {
    let command = match args.word("channel command")? {
        "set" => Command::ChannelSet {
            channel: args.index("channel")?,
            gains: args.rest_floats("gain")?,
        },
        "get" => Command::ChannelGet {
            channel: args.index("channel")?,
        },
        "post" => Command::ChannelPost {
            channel: args.optional_target("channel")?,
        },
        "on" => Command::Active {
            channel: args.target("channel")?,
            on: true,
        },
        "off" => Command::Active {
            channel: args.target("channel")?,
            on: false,
        },
        "current" => Command::Observe {
            channel: args.index("channel")?,
        },
        other => return Err(args.error(format!("unknown channel command '{other}'"))),
    };
    Ok(command)
}

/// `ramp_max <channel> (<state> <weight>)+ <ms> <family>`
fn parse_ramp_max(args: &mut Args<'_>) -> Result<Command, ConfigError> {
    let channel = args.index("channel")?;
    let rest = args.remaining().len();
    if rest < 4 || rest % 2 != 0 {
        return Err(args.error("expected (state weight) pairs, a time in ms and a curve family"));
    }
    let mut pairs = Vec::with_capacity(rest / 2 - 1);
    for _ in 0..rest / 2 - 1 {
        pairs.push((args.index("state")?, args.float("weight")?));
    }
    Ok(Command::RampMax {
        channel,
        pairs,
        duration_ms: args.float("time in ms")?,
        family: args.parse("ramp or xfade")?,
    })
}

/// `set <family> [shape] [param]`
fn parse_curve(args: &mut Args<'_>) -> Result<Command, ConfigError> {
    let family: CurveFamily = args.parse("ramp or xfade")?;
    let shape = match args.peek() {
        Some(token) if token.parse::<f64>().is_err() => Some(args.parse::<CurveShape>("curve shape")?),
        _ => None,
    };
    let param = match args.peek() {
        Some(_) => Some(args.float("curve parameter")?),
        None => None,
    };
    Ok(Command::Curve {
        family,
        shape,
        param,
    })
}

struct Args<'a> {
    line: &'a str,
    tokens: Vec<&'a str>,
    pos: usize,
}

impl<'a> Args<'a> {
    fn new(line: &'a str) -> Self {
        Self {
            line,
            tokens: line.split_whitespace().collect(),
            pos: 0,
        }
    }

    fn error(&self, reason: impl Into<String>) -> ConfigError {
        ConfigError::Command {
            command: self.line.trim().to_string(),
            reason: reason.into(),
        }
    }

    fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.pos).copied()
    }

    fn remaining(&self) -> &[&'a str] {
        &self.tokens[self.pos.min(self.tokens.len())..]
    }

    fn word(&mut self, what: &str) -> Result<&'a str, ConfigError> {
        let token = self
            .peek()
            .ok_or_else(|| self.error(format!("missing {what}")))?;
        self.pos += 1;
        Ok(token)
    }

    fn parse<T: FromStr>(&mut self, what: &str) -> Result<T, ConfigError> {
        let token = self.word(what)?;
        token
            .parse()
            .map_err(|_| self.error(format!("expected {what}, found '{token}'")))
    }

    fn index(&mut self, what: &str) -> Result<usize, ConfigError> {
        self.parse(what)
    }

    fn float(&mut self, what: &str) -> Result<f64, ConfigError> {
        self.parse(what)
    }

    fn flag(&mut self, what: &str) -> Result<bool, ConfigError> {
        match self.word(what)? {
            "1" | "on" | "true" => Ok(true),
            "0" | "off" | "false" => Ok(false),
            token => Err(self.error(format!("expected {what}, found '{token}'"))),
        }
    }

    /// A channel or state index, or `all`.
    fn target(&mut self, what: &str) -> Result<Option<usize>, ConfigError> {
        if self.peek() == Some("all") {
            self.pos += 1;
            return Ok(None);
        }
        self.index(what).map(Some)
    }

    /// Like [`Args::target`], with a missing token meaning `all`.
    fn optional_target(&mut self, what: &str) -> Result<Option<usize>, ConfigError> {
        if self.peek().is_none() {
            return Ok(None);
        }
        self.target(what)
    }

    fn protection(&mut self) -> Result<Protection, ConfigError> {
        match self.peek() {
            None => Ok(Protection::Default),
            Some(_) => self.parse("protect or override"),
        }
    }

    /// Delete and rename take no `protect` mode.
    fn override_only(&mut self) -> Result<Protection, ConfigError> {
        match self.peek() {
            None => Ok(Protection::Default),
            Some("override") => {
                self.pos += 1;
                Ok(Protection::Override)
            }
            Some(other) => Err(self.error(format!("expected 'override', found '{other}'"))),
        }
    }

    fn rest_floats(&mut self, what: &str) -> Result<Vec<f64>, ConfigError> {
        let mut values = Vec::with_capacity(self.remaining().len());
        while self.peek().is_some() {
            values.push(self.float(what)?);
        }
        if values.is_empty() {
            return Err(self.error(format!("missing {what}")));
        }
        Ok(values)
    }

    fn finish(&self) -> Result<(), ConfigError> {
        match self.peek() {
            None => Ok(()),
            Some(token) => Err(self.error(format!("unexpected argument '{token}'"))),
        }
    }
}
