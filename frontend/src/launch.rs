use std::ffi::OsString;
use std::process::Command;

use tracing::{info, warn};

use crate::error::LaunchError;
use crate::model::Game;

const ROM_TOKEN: &str = "{rom}";

/// Starts an external program. Implementations must not wait for it.
pub trait ProcessRunner {
    fn run(&mut self, command: &str, argument: &str) -> Result<(), LaunchError>;
}

/// Split an emulator command into program and arguments, substituting the
/// `{rom}` token or appending the argument when the token is absent.
pub fn build_command(command: &str, argument: &str) -> Result<(String, Vec<OsString>), LaunchError> {
    let mut parts = command.split_whitespace();
    let program = parts.next().ok_or(LaunchError::EmptyCommand)?.to_string();
    let mut args: Vec<OsString> = Vec::new();
    let mut substituted = false;
    for a in parts {
        if a == ROM_TOKEN {
            args.push(OsString::from(argument));
            substituted = true;
        } else {
            args.push(OsString::from(a));
        }
    }
    if !substituted {
        args.push(OsString::from(argument));
    }
    Ok((program, args))
}

/// Spawns the emulator with `std::process::Command` and lets it run on its own.
#[derive(Debug, Default)]
pub struct CommandRunner;

impl ProcessRunner for CommandRunner {
    fn run(&mut self, command: &str, argument: &str) -> Result<(), LaunchError> {
        let (program, args) = build_command(command, argument)?;
        let child = Command::new(&program)
            .args(&args)
            .spawn()
            .map_err(|source| LaunchError::Spawn {
                program: program.clone(),
                source,
            })?;
        info!("Launched {} with pid={}", program, child.id());
        Ok(())
    }
}

/// Hands a selected game to the process runner, once per attempt.
pub struct LaunchDispatcher<R> {
    runner: R,
}

impl<R: ProcessRunner> LaunchDispatcher<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    pub fn launch(&mut self, game: &Game) -> Result<(), LaunchError> {
        match self.runner.run(&game.emulator, &game.path) {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!("Failed to launch {}: {}", game.title, e);
                Err(e)
            }
        }
    }

    #[cfg(test)]
    pub fn runner(&self) -> &R {
        &self.runner
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;

    /// Records every run call; fails while `fail` is set.
    #[derive(Debug, Default)]
    pub struct RecordingRunner {
        pub calls: Vec<(String, String)>,
        pub fail: bool,
    }

    impl ProcessRunner for RecordingRunner {
        fn run(&mut self, command: &str, argument: &str) -> Result<(), LaunchError> {
            self.calls.push((command.to_string(), argument.to_string()));
            if self.fail {
                Err(LaunchError::Spawn {
                    program: command.to_string(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
                })
            } else {
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingRunner;
    use super::*;

    fn game() -> Game {
        Game {
            title: "Metroid".into(),
            path: "/roms/nes/Metroid (USA).nes".into(),
            emulator: "fceux --fullscreen 1".into(),
        }
    }

    #[test]
    fn rom_is_appended_without_token() {
        let (program, args) = build_command("fceux --fullscreen 1", "/roms/a b.nes").unwrap();
        assert_eq!(program, "fceux");
        assert_eq!(
            args,
            vec![
                OsString::from("--fullscreen"),
                OsString::from("1"),
                OsString::from("/roms/a b.nes")
            ]
        );
    }

    #[test]
    fn rom_token_is_substituted_in_place() {
        let (program, args) = build_command("retroarch -L core.so {rom} -f", "/x.sfc").unwrap();
        assert_eq!(program, "retroarch");
        assert_eq!(args[2], OsString::from("/x.sfc"));
        assert_eq!(args.len(), 4);
    }

    #[test]
    fn empty_command_is_rejected() {
        assert!(matches!(build_command("   ", "/x"), Err(LaunchError::EmptyCommand)));
        assert!(CommandRunner.run("", "/x").is_err());
    }

    #[test]
    fn missing_program_reports_spawn_error() {
        let err = CommandRunner
            .run("/nonexistent/definitely-not-an-emulator", "/x")
            .unwrap_err();
        assert!(matches!(err, LaunchError::Spawn { .. }));
    }

    #[test]
    fn dispatcher_passes_references_through() {
        let mut d = LaunchDispatcher::new(RecordingRunner::default());
        d.launch(&game()).unwrap();
        assert_eq!(
            d.runner().calls,
            vec![(
                "fceux --fullscreen 1".to_string(),
                "/roms/nes/Metroid (USA).nes".to_string()
            )]
        );
    }

    #[test]
    fn dispatcher_reports_failure() {
        let mut d = LaunchDispatcher::new(RecordingRunner {
            fail: true,
            ..Default::default()
        });
        assert!(d.launch(&game()).is_err());
        assert_eq!(d.runner().calls.len(), 1);
    }
}
