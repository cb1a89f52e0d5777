// components/media_downloader/src/bootstrap.rs
//! One-time precondition check for the ffmpeg binary the engine relies on.
//!
//! The gate never touches the process environment. It returns the binary it
//! resolved and the caller threads that path into the engine.

use crate::error::BootstrapError;
use crate::utils::{parse_sha256_token, sha256_file};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info, warn};
use url::Url;

/// Known-good ffmpeg distribution
pub const FFMPEG_ARCHIVE_URL: &str =
    "https://www.gyan.dev/ffmpeg/builds/ffmpeg-release-essentials.zip";

const TOOL_NAME: &str = "ffmpeg";

#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    /// Where a downloaded distribution is unpacked
    pub tools_dir: PathBuf,
    pub archive_url: Url,
    /// Compare the archive against the `<archive_url>.sha256` published next to it
    pub verify_checksum: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencySource {
    /// Already on the executable search path
    Found,
    /// Left in the tools directory by an earlier install
    Reused,
    /// Downloaded and unpacked by this run
    Installed,
}

/// The resolved ffmpeg binary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineDependency {
    pub ffmpeg: PathBuf,
    pub source: DependencySource,
}

/// Make sure ffmpeg is usable, installing it into `tools_dir` when it is not.
///
/// Blocking; run it once before accepting any job.
pub fn ensure_engine_dependency(
    config: &BootstrapConfig,
) -> Result<EngineDependency, BootstrapError> {
    resolve(config, which::which(TOOL_NAME).ok())
}

/// The gate itself, with the `PATH` lookup result passed in
fn resolve(
    config: &BootstrapConfig,
    on_path: Option<PathBuf>,
) -> Result<EngineDependency, BootstrapError> {
    if let Some(path) = on_path {
        if probe(&path) {
            debug!("ffmpeg found at {}", path.display());
            return Ok(EngineDependency {
                ffmpeg: path,
                source: DependencySource::Found,
            });
        }
        warn!("{} is on PATH but does not run", path.display());
    }

    if let Some(path) = installed_binary(&config.tools_dir) {
        if probe(&path) {
            info!("using ffmpeg from {}", path.display());
            return Ok(EngineDependency {
                ffmpeg: path,
                source: DependencySource::Reused,
            });
        }
    }

    info!("FFmpeg not found. Installing...");
    let ffmpeg = install(config)?;
    info!("FFmpeg installed at {}", ffmpeg.display());

    Ok(EngineDependency {
        ffmpeg,
        source: DependencySource::Installed,
    })
}

fn install(config: &BootstrapConfig) -> Result<PathBuf, BootstrapError> {
    // The default distribution only ships ffmpeg.exe
    if !cfg!(windows) && config.archive_url.as_str() == FFMPEG_ARCHIVE_URL {
        return Err(BootstrapError::UnsupportedPlatform(config.archive_url.to_string()));
    }

    fs::create_dir_all(&config.tools_dir)
        .map_err(|e| BootstrapError::io("creating tools directory", e))?;

    let mut archive = tempfile::Builder::new()
        .prefix(".download-")
        .suffix(".zip")
        .tempfile_in(&config.tools_dir)
        .map_err(|e| BootstrapError::io("creating temporary archive", e))?;

    download_to(&config.archive_url, archive.as_file_mut())?;

    if config.verify_checksum {
        let expected = fetch_checksum(&config.archive_url)?;
        verify_checksum(archive.path(), &expected, config.archive_url.as_str())?;
    }

    // Unpacked next to the final location; removed on drop unless promoted
    let staging = tempfile::Builder::new()
        .prefix(".extract-")
        .tempdir_in(&config.tools_dir)
        .map_err(|e| BootstrapError::io("creating staging directory", e))?;

    let file = archive
        .reopen()
        .map_err(|e| BootstrapError::io("reopening archive", e))?;
    extract_zip(file, staging.path())?;

    archive
        .close()
        .map_err(|e| BootstrapError::io("removing temporary archive", e))?;

    let staged = installed_binary(staging.path()).ok_or(BootstrapError::BinaryNotFound("FFmpeg"))?;
    let relative = staged
        .strip_prefix(staging.path())
        .map_err(|_| BootstrapError::BinaryNotFound("FFmpeg"))?
        .to_path_buf();
    let distribution = relative
        .components()
        .next()
        .ok_or(BootstrapError::BinaryNotFound("FFmpeg"))?;

    let target = config.tools_dir.join(distribution);
    if target.exists() {
        fs::remove_dir_all(&target)
            .map_err(|e| BootstrapError::io("replacing previous install", e))?;
    }
    fs::rename(staging.path().join(distribution), &target)
        .map_err(|e| BootstrapError::io("moving ffmpeg into place", e))?;

    staging
        .close()
        .map_err(|e| BootstrapError::io("removing staging directory", e))?;

    let ffmpeg = config.tools_dir.join(relative);
    dunce::canonicalize(&ffmpeg).map_err(|e| BootstrapError::io("resolving ffmpeg path", e))
}

fn download_to(url: &Url, out: &mut fs::File) -> Result<(), BootstrapError> {
    debug!("downloading {url}");
    let response = ureq::get(url.as_str())
        .call()
        .map_err(|e| BootstrapError::Download {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let mut reader = response.into_body().into_reader();
    std::io::copy(&mut reader, out).map_err(|e| BootstrapError::io("writing archive", e))?;
    out.flush()
        .map_err(|e| BootstrapError::io("writing archive", e))
}

fn checksum_url(archive_url: &Url) -> String {
    format!("{archive_url}.sha256")
}

fn fetch_checksum(archive_url: &Url) -> Result<String, BootstrapError> {
    let url = checksum_url(archive_url);
    let text = ureq::get(&url)
        .call()
        .and_then(|response| response.into_body().read_to_string())
        .map_err(|e| BootstrapError::Download {
            url: url.clone(),
            reason: e.to_string(),
        })?;

    parse_sha256_token(&text).ok_or(BootstrapError::ChecksumMissing(url))
}

fn verify_checksum(path: &Path, expected: &str, url: &str) -> Result<(), BootstrapError> {
    let actual = sha256_file(path).map_err(|e| BootstrapError::io("hashing archive", e))?;
    if !actual.eq_ignore_ascii_case(expected) {
        return Err(BootstrapError::ChecksumMismatch {
            url: url.to_owned(),
            expected: expected.to_owned(),
            actual,
        });
    }
    Ok(())
}

/// Unpack every entry of `archive` below `out_dir`
fn extract_zip(archive: fs::File, out_dir: &Path) -> Result<(), BootstrapError> {
    let mut archive =
        zip::ZipArchive::new(archive).map_err(|e| BootstrapError::Archive(e.to_string()))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| BootstrapError::Archive(e.to_string()))?;

        // Rejects absolute paths and `..` components.
        let rel = entry
            .enclosed_name()
            .map(Path::to_path_buf)
            .ok_or_else(|| BootstrapError::Archive(format!("unsafe zip path: {}", entry.name())))?;
        let out_path = out_dir.join(rel);

        if entry.is_dir() {
            fs::create_dir_all(&out_path).map_err(|e| BootstrapError::io("extracting archive", e))?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).map_err(|e| BootstrapError::io("extracting archive", e))?;
        }
        let mut out = fs::File::create(&out_path)
            .map_err(|e| BootstrapError::io("extracting archive", e))?;
        std::io::copy(&mut entry, &mut out)
            .map_err(|e| BootstrapError::io("extracting archive", e))?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&out_path, fs::Permissions::from_mode(mode))
                .map_err(|e| BootstrapError::io("extracting archive", e))?;
        }
    }

    Ok(())
}

/// The `bin` directory of the first unpacked distribution under `root`
fn locate_bin_dir(root: &Path) -> Option<PathBuf> {
    let mut candidates: Vec<PathBuf> = fs::read_dir(root)
        .ok()?
        .filter_map(Result::ok)
        .filter(|entry| entry.path().is_dir())
        .filter(|entry| {
            entry
                .file_name()
                .to_string_lossy()
                .to_lowercase()
                .contains(TOOL_NAME)
        })
        .map(|entry| entry.path())
        .collect();
    candidates.sort();

    candidates
        .into_iter()
        .map(|dir| dir.join("bin"))
        .find(|bin| bin.is_dir())
}

fn installed_binary(tools_dir: &Path) -> Option<PathBuf> {
    let binary = locate_bin_dir(tools_dir)?.join(binary_name());
    binary.is_file().then_some(binary)
}

fn binary_name() -> &'static str {
    if cfg!(windows) {
        "ffmpeg.exe"
    } else {
        TOOL_NAME
    }
}

/// Run `<ffmpeg> -version` and report whether it succeeded
fn probe(program: &Path) -> bool {
    Command::new(program)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::{BufRead, BufReader};
    use std::net::TcpListener;
    use tempfile::TempDir;
    use zip::write::FileOptions;

    const FAKE_FFMPEG: &[u8] = b"#!/bin/sh\necho 'ffmpeg version test'\n";

    fn build_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        for (name, contents) in entries {
            let options = FileOptions::default().unix_permissions(0o755);
            zip.start_file(*name, options).unwrap();
            zip.write_all(contents).unwrap();
        }
        zip.finish().unwrap();
    }

    fn distribution(dir: &Path) -> PathBuf {
        let archive = dir.join("dist.zip");
        build_zip(
            &archive,
            &[
                ("ffmpeg-7.1-essentials_build/README.txt", b"readme"),
                ("ffmpeg-7.1-essentials_build/bin/ffmpeg", FAKE_FFMPEG),
                ("ffmpeg-7.1-essentials_build/bin/ffmpeg.exe", FAKE_FFMPEG),
            ],
        );
        archive
    }

    #[test]
    fn extract_and_locate_binary() {
        let src = TempDir::new().unwrap();
        let tools = TempDir::new().unwrap();
        let archive = distribution(src.path());

        extract_zip(fs::File::open(&archive).unwrap(), tools.path()).unwrap();

        let bin = locate_bin_dir(tools.path()).unwrap();
        assert_eq!(bin, tools.path().join("ffmpeg-7.1-essentials_build").join("bin"));

        let binary = installed_binary(tools.path()).unwrap();
        assert!(binary.ends_with(Path::new("bin").join(binary_name())));
    }

    #[test]
    fn locate_ignores_files_and_unrelated_dirs() {
        let tools = TempDir::new().unwrap();
        fs::write(tools.path().join("ffmpeg.zip"), b"zip").unwrap();
        fs::create_dir_all(tools.path().join("other").join("bin")).unwrap();
        assert_eq!(locate_bin_dir(tools.path()), None);

        fs::create_dir_all(tools.path().join("FFmpeg-build").join("bin")).unwrap();
        assert_eq!(
            locate_bin_dir(tools.path()),
            Some(tools.path().join("FFmpeg-build").join("bin"))
        );
    }

    #[test]
    fn missing_binary_is_not_installed() {
        let tools = TempDir::new().unwrap();
        fs::create_dir_all(tools.path().join("ffmpeg-build").join("bin")).unwrap();
        assert_eq!(installed_binary(tools.path()), None);
    }

    #[test]
    fn traversal_entries_are_rejected() {
        let src = TempDir::new().unwrap();
        let tools = TempDir::new().unwrap();
        let archive = src.path().join("evil.zip");
        build_zip(&archive, &[("../escaped.txt", b"nope")]);

        let result = extract_zip(fs::File::open(&archive).unwrap(), tools.path());
        assert_matches!(result, Err(BootstrapError::Archive(_)));
        assert!(!src.path().join("escaped.txt").exists());
    }

    #[test]
    fn corrupt_archive_is_reported() {
        let src = TempDir::new().unwrap();
        let path = src.path().join("broken.zip");
        fs::write(&path, b"this is not a zip").unwrap();

        let result = extract_zip(fs::File::open(&path).unwrap(), src.path());
        assert_matches!(result, Err(BootstrapError::Archive(_)));
    }

    #[test]
    fn checksum_verification() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("abc");
        fs::write(&path, b"abc").unwrap();

        let good = "BA7816BF8F01CFEA414140DE5DAE2223B00361A396177A9CB410FF61F20015AD";
        assert!(verify_checksum(&path, good, "https://example.com/abc").is_ok());

        let bad = "0".repeat(64);
        assert_matches!(
            verify_checksum(&path, &bad, "https://example.com/abc"),
            Err(BootstrapError::ChecksumMismatch { .. })
        );
    }

    #[test]
    fn checksum_url_is_sibling_of_archive() {
        let url = Url::parse(FFMPEG_ARCHIVE_URL).unwrap();
        assert_eq!(
            checksum_url(&url),
            "https://www.gyan.dev/ffmpeg/builds/ffmpeg-release-essentials.zip.sha256"
        );
    }

    #[test]
    fn unreachable_archive_fails_install() {
        let tools = TempDir::new().unwrap();
        let config = BootstrapConfig {
            tools_dir: tools.path().to_path_buf(),
            archive_url: Url::parse("http://127.0.0.1:9/ffmpeg.zip").unwrap(),
            verify_checksum: false,
        };

        assert_matches!(install(&config), Err(BootstrapError::Download { .. }));
        // The temporary archive does not outlive a failed install.
        assert_eq!(fs::read_dir(tools.path()).unwrap().count(), 0);
    }

    /// Plain HTTP server answering GETs from `files` by request path
    fn serve(files: Vec<(&'static str, Vec<u8>)>) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        std::thread::spawn(move || {
            for stream in listener.incoming() {
                let mut stream = stream.unwrap();
                let mut reader = BufReader::new(stream.try_clone().unwrap());
                let mut request_line = String::new();
                reader.read_line(&mut request_line).unwrap();
                loop {
                    let mut header = String::new();
                    if reader.read_line(&mut header).unwrap() <= 2 {
                        break;
                    }
                }

                let path = request_line.split_whitespace().nth(1).unwrap_or("/");
                match files.iter().find(|(p, _)| *p == path) {
                    Some((_, body)) => {
                        write!(
                            stream,
                            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                            body.len()
                        )
                        .unwrap();
                        stream.write_all(body).unwrap();
                    }
                    None => stream
                        .write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
                        .unwrap(),
                }
            }
        });

        Url::parse(&format!("http://{addr}/ffmpeg-release.zip")).unwrap()
    }

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn install_downloads_verifies_and_cleans_up() {
        let src = TempDir::new().unwrap();
        let tools = TempDir::new().unwrap();
        let archive = distribution(src.path());
        let digest = sha256_file(&archive).unwrap();
        let url = serve(vec![
            ("/ffmpeg-release.zip", fs::read(&archive).unwrap()),
            (
                "/ffmpeg-release.zip.sha256",
                format!("{digest}  ffmpeg-release.zip\n").into_bytes(),
            ),
        ]);
        let config = BootstrapConfig {
            tools_dir: tools.path().to_path_buf(),
            archive_url: url,
            verify_checksum: true,
        };

        let dependency = resolve(&config, None).unwrap();

        assert_eq!(dependency.source, DependencySource::Installed);
        assert!(dependency
            .ffmpeg
            .ends_with(Path::new("ffmpeg-7.1-essentials_build").join("bin").join(binary_name())));
        assert!(dependency.ffmpeg.is_file());
        // Neither the downloaded archive nor the staging directory is left behind.
        assert_eq!(entries(tools.path()), vec!["ffmpeg-7.1-essentials_build"]);
    }

    #[test]
    fn archive_without_binary_leaves_nothing_behind() {
        let src = TempDir::new().unwrap();
        let tools = TempDir::new().unwrap();
        let archive = src.path().join("empty.zip");
        build_zip(&archive, &[("ffmpeg-7.1-essentials_build/README.txt", b"readme")]);
        let config = BootstrapConfig {
            tools_dir: tools.path().to_path_buf(),
            archive_url: serve(vec![("/ffmpeg-release.zip", fs::read(&archive).unwrap())]),
            verify_checksum: false,
        };

        assert_matches!(resolve(&config, None), Err(BootstrapError::BinaryNotFound(_)));
        assert!(entries(tools.path()).is_empty());
    }

    #[cfg(not(windows))]
    #[test]
    fn default_archive_is_refused_off_windows() {
        let tools = TempDir::new().unwrap();
        let config = BootstrapConfig {
            tools_dir: tools.path().to_path_buf(),
            archive_url: Url::parse(FFMPEG_ARCHIVE_URL).unwrap(),
            verify_checksum: true,
        };

        assert_matches!(install(&config), Err(BootstrapError::UnsupportedPlatform(_)));
        assert!(entries(tools.path()).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn previous_install_is_reused_without_network() {
        let src = TempDir::new().unwrap();
        let tools = TempDir::new().unwrap();
        extract_zip(fs::File::open(distribution(src.path())).unwrap(), tools.path()).unwrap();
        let config = BootstrapConfig {
            tools_dir: tools.path().to_path_buf(),
            // Nothing listens here; any download attempt would fail the test.
            archive_url: Url::parse("http://127.0.0.1:9/ffmpeg.zip").unwrap(),
            verify_checksum: true,
        };

        let dependency = resolve(&config, None).unwrap();
        assert_eq!(dependency.source, DependencySource::Reused);
        assert_eq!(Some(dependency.ffmpeg), installed_binary(tools.path()));
    }

    #[cfg(unix)]
    #[test]
    fn binary_on_path_wins() {
        let src = TempDir::new().unwrap();
        let tools = TempDir::new().unwrap();
        let empty_tools = TempDir::new().unwrap();
        extract_zip(fs::File::open(distribution(src.path())).unwrap(), tools.path()).unwrap();
        let on_path = installed_binary(tools.path()).unwrap();
        let config = BootstrapConfig {
            tools_dir: empty_tools.path().to_path_buf(),
            archive_url: Url::parse("http://127.0.0.1:9/ffmpeg.zip").unwrap(),
            verify_checksum: true,
        };

        let dependency = resolve(&config, Some(on_path.clone())).unwrap();
        assert_eq!(dependency.source, DependencySource::Found);
        assert_eq!(dependency.ffmpeg, on_path);
        assert!(entries(empty_tools.path()).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn probe_runs_extracted_binary() {
        let src = TempDir::new().unwrap();
        let tools = TempDir::new().unwrap();
        extract_zip(fs::File::open(distribution(src.path())).unwrap(), tools.path()).unwrap();

        let binary = installed_binary(tools.path()).unwrap();
        assert!(probe(&binary));
        assert!(!probe(&tools.path().join("missing")));
    }
}
