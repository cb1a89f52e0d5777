// bases/download_cli/src/shell.rs
use crate::config::Config;
use crate::output::OutputHandler;
use color_eyre::Result;
use media_downloader::{JobFlags, JobHandle, JobMode, JobRequest, MediaDownloader, Notification};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    AudioOnly,
    Subtitles,
    Thumbnail,
    Archive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Action { mode: JobMode, url: String },
    Set { toggle: Toggle, enabled: bool },
    Dir(PathBuf),
    Options,
    Status,
    Help,
    Quit,
    Empty,
}

impl ShellCommand {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "" => ShellCommand::Empty,
            "download" => ShellCommand::Action {
                mode: JobMode::StandardDownload,
                url: rest.to_string(),
            },
            "record" => ShellCommand::Action {
                mode: JobMode::LivestreamRecord,
                url: rest.to_string(),
            },
            "metadata" => ShellCommand::Action {
                mode: JobMode::MetadataOnly,
                url: rest.to_string(),
            },
            "set" => parse_set(rest)?,
            "dir" if rest.is_empty() => return Err("Usage: dir <path>".to_string()),
            "dir" => ShellCommand::Dir(PathBuf::from(rest)),
            "options" => ShellCommand::Options,
            "status" => ShellCommand::Status,
            "help" | "?" => ShellCommand::Help,
            "quit" | "exit" => ShellCommand::Quit,
            other => return Err(format!("Unknown command '{}', try 'help'", other)),
        };
        Ok(command)
    }
}

fn parse_set(rest: &str) -> Result<ShellCommand, String> {
    let usage = || "Usage: set <audio|subtitles|thumbnail|archive> <on|off>".to_string();
    let mut parts = rest.split_whitespace();

    let toggle = match parts.next().map(str::to_ascii_lowercase).as_deref() {
        Some("audio") => Toggle::AudioOnly,
        Some("subtitles" | "subs") => Toggle::Subtitles,
        Some("thumbnail" | "thumb") => Toggle::Thumbnail,
        Some("archive") => Toggle::Archive,
        _ => return Err(usage()),
    };
    let enabled = match parts.next().map(str::to_ascii_lowercase).as_deref() {
        Some("on") => true,
        Some("off") => false,
        _ => return Err(usage()),
    };
    if parts.next().is_some() {
        return Err(usage());
    }

    Ok(ShellCommand::Set { toggle, enabled })
}

/// Interactive front end: actions start in the background and the prompt stays free
pub struct Shell {
    output_dir: PathBuf,
    flags: JobFlags,
    output: OutputHandler,
}

impl Shell {
    pub fn new(config: &Config, output: OutputHandler) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            flags: config.flags,
            output,
        }
    }

    pub async fn run(
        mut self,
        downloader: MediaDownloader,
        mut notifications: mpsc::UnboundedReceiver<Notification>,
    ) -> Result<()> {
        let mut status = downloader.status();
        let status_output = self.output.clone();
        let status_printer = tokio::spawn(async move {
            let mut last = String::new();
            while let Some(message) = status.changed().await {
                // Queued and Running share a text for most actions
                if message.text != last {
                    status_output.print_status(&message);
                    last = message.text.clone();
                }
            }
        });

        let notify_output = self.output.clone();
        let notification_printer = tokio::spawn(async move {
            while let Some(notification) = notifications.recv().await {
                notify_output.print_notification(&notification);
            }
        });

        self.output.print_shell_help();

        let mut jobs: Vec<JobHandle> = Vec::new();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            let command = match ShellCommand::parse(&line) {
                Ok(command) => command,
                Err(message) => {
                    self.output.print_shell_error(&message);
                    continue;
                }
            };

            match command {
                ShellCommand::Empty => {}
                ShellCommand::Quit => break,
                ShellCommand::Help => self.output.print_shell_help(),
                ShellCommand::Options => self.output.print_options(&self.output_dir, &self.flags),
                ShellCommand::Status => {
                    let current = downloader.status().current();
                    if current.text.is_empty() {
                        println!("Idle");
                    } else {
                        self.output.print_status(&current);
                    }
                }
                ShellCommand::Dir(path) => {
                    debug!("Download folder set to {}", path.display());
                    self.output_dir = path;
                }
                ShellCommand::Set { toggle, enabled } => self.apply(toggle, enabled),
                ShellCommand::Action { mode, url } => {
                    let flags = match mode {
                        JobMode::MetadataOnly => JobFlags::default(),
                        _ => self.flags,
                    };
                    match JobRequest::new(&url, &self.output_dir, mode, flags) {
                        Ok(request) => {
                            jobs.retain(|job| !job.is_finished());
                            jobs.push(downloader.submit(request));
                        }
                        Err(e) => self.output.print_shell_error(&e.to_string()),
                    }
                }
            }
        }

        let running: Vec<_> = jobs.iter().filter(|job| !job.is_finished()).collect();
        if !running.is_empty() {
            warn!("{} job(s) still running, leaving them unfinished", running.len());
            for job in running {
                eprintln!("Job #{} ({}) did not finish", job.id(), job.action());
            }
        }

        status_printer.abort();
        notification_printer.abort();
        Ok(())
    }

    fn apply(&mut self, toggle: Toggle, enabled: bool) {
        match toggle {
            Toggle::AudioOnly => self.flags.audio_only = enabled,
            Toggle::Subtitles => self.flags.subtitles = enabled,
            Toggle::Thumbnail => self.flags.thumbnail = enabled,
            Toggle::Archive => self.flags.archive_mode = enabled,
        }
    }
}
