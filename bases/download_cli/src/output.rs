// bases/download_cli/src/output.rs
use media_downloader::{
    DependencySource, EngineDependency, JobOutput, JobReport, Notification, NotificationKind,
    StatusMessage,
};

#[derive(Debug, Clone)]
pub struct OutputHandler {
    verbose: bool,
}

impl OutputHandler {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn print_dependency(&self, dependency: &EngineDependency) {
        match dependency.source {
            DependencySource::Installed => {
                println!("FFmpeg installed: {}", dependency.ffmpeg.display())
            }
            DependencySource::Found | DependencySource::Reused => {
                if self.verbose {
                    println!("Using FFmpeg: {}", dependency.ffmpeg.display());
                }
            }
        }
    }

    pub fn print_status(&self, status: &StatusMessage) {
        if !status.text.is_empty() {
            println!("{}", status);
        }
    }

    pub fn print_notification(&self, notification: &Notification) {
        match notification.kind {
            NotificationKind::Success => println!("Success: {}", notification.message),
            NotificationKind::Error => eprintln!("Error: {}", notification.message),
        }
    }

    pub fn print_report(&self, report: &JobReport) {
        if !self.verbose {
            return;
        }

        println!("Job #{} ({})", report.id, report.action);
        if let Ok(JobOutput::Metadata(export)) = &report.outcome {
            println!("JSON: {}", export.json_path.display());
            println!("CSV: {}", export.csv_path.display());
        }
        println!("Started: {}", report.started_at);
        println!(
            "Duration: {:.1} seconds",
            (report.finished_at - report.started_at).num_milliseconds() as f64 / 1000.0
        );
    }

    pub fn print_shell_help(&self) {
        println!("Commands:");
        println!("  download <url>         download a video, audio track or playlist");
        println!("  record <url>           record a live stream from its beginning");
        println!("  metadata <url>         write metadata.json and metadata.csv");
        println!("  set <option> on|off    audio, subtitles, thumbnail, archive");
        println!("  dir <path>             change the download folder");
        println!("  options                show the current folder and options");
        println!("  status                 show the current status");
        println!("  help                   show this help");
        println!("  quit                   leave the shell");
    }

    pub fn print_options(&self, output_dir: &std::path::Path, flags: &media_downloader::JobFlags) {
        let on_off = |value: bool| if value { "on" } else { "off" };
        println!("Download folder: {}", output_dir.display());
        println!("Audio only (MP3): {}", on_off(flags.audio_only));
        println!("Subtitles: {}", on_off(flags.subtitles));
        println!("Thumbnail: {}", on_off(flags.thumbnail));
        println!("Archive mode (no redownload): {}", on_off(flags.archive_mode));
    }

    pub fn print_shell_error(&self, message: &str) {
        eprintln!("{}", message);
    }

    pub fn print_error(&self, error: &color_eyre::Report) {
        eprintln!("Error: {}", error);

        if self.verbose {
            eprintln!("\nError details:");
            error.chain().skip(1).for_each(|cause| {
                eprintln!("  caused by: {}", cause);
            });
        }
    }
}
