//! Argument lists for the two ways the tool is invoked.

use std::ffi::OsString;
use std::path::Path;

use crate::config::ToolConfig;
use crate::job::Quality;

use super::identity::ClientIdentity;

/// Output name template; the tool substitutes title and extension.
pub const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

/// Announces the resolved title on stdout in the `[info] <title>` shape before
/// the transfer starts.
const TITLE_ANNOUNCEMENT: &str = "before_dl:[info] %(title)s";

/// Full download: progress one line per update, resumable, identity-specific.
pub fn download_args(
    target: &str,
    quality: Quality,
    identity: &ClientIdentity,
    output_dir: &Path,
    tool: &ToolConfig,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "--newline".into(),
        "--no-playlist".into(),
        "--no-colors".into(),
        "--progress".into(),
        "--no-simulate".into(),
        "--print".into(),
        TITLE_ANNOUNCEMENT.into(),
        "-o".into(),
        output_dir.join(OUTPUT_TEMPLATE).into_os_string(),
        "-f".into(),
        quality.format_selector().into(),
        "--continue".into(),
    ];
    push_identity(&mut args, identity);
    push_network_flags(&mut args, tool);
    args.push(target.into());
    args
}

/// Metadata-only run that prints just the title.
pub fn title_args(target: &str, identity: &ClientIdentity, tool: &ToolConfig) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "--skip-download".into(),
        "--no-playlist".into(),
        "--no-warnings".into(),
        "--print".into(),
        "title".into(),
    ];
    push_identity(&mut args, identity);
    args.push("--socket-timeout".into());
    args.push(tool.socket_timeout_secs.to_string().into());
    args.push(target.into());
    args
}

fn push_identity(args: &mut Vec<OsString>, identity: &ClientIdentity) {
    args.push("--user-agent".into());
    args.push(identity.user_agent.into());
    args.push("--extractor-args".into());
    args.push(identity.extractor_args().into());
}

fn push_network_flags(args: &mut Vec<OsString>, tool: &ToolConfig) {
    args.push("--retries".into());
    args.push(tool.retries.to_string().into());
    args.push("--fragment-retries".into());
    args.push(tool.fragment_retries.to_string().into());
    args.push("--socket-timeout".into());
    args.push(tool.socket_timeout_secs.to_string().into());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::DEFAULT_IDENTITIES;

    fn value_after<'a>(args: &'a [OsString], flag: &str) -> Option<&'a str> {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .and_then(|v| v.to_str())
    }

    #[test]
    fn download_args_carry_identity_quality_and_flags() {
        let tool = ToolConfig {
            retries: 7,
            fragment_retries: 2,
            socket_timeout_secs: 12,
        };
        let identity = &DEFAULT_IDENTITIES[1];
        let args = download_args(
            "https://www.youtube.com/watch?v=AAAAAAAAAAA",
            Quality::Worst,
            identity,
            Path::new("/media/out"),
            &tool,
        );
        assert_eq!(value_after(&args, "-o"), Some("/media/out/%(title)s.%(ext)s"));
        assert_eq!(value_after(&args, "-f"), Some("worst"));
        assert_eq!(value_after(&args, "--user-agent"), Some(identity.user_agent));
        assert_eq!(
            value_after(&args, "--extractor-args"),
            Some("youtube:player_client=ios")
        );
        assert_eq!(value_after(&args, "--retries"), Some("7"));
        assert_eq!(value_after(&args, "--fragment-retries"), Some("2"));
        assert_eq!(value_after(&args, "--socket-timeout"), Some("12"));
        assert!(args.iter().any(|a| a == "--continue"));
        assert!(args.iter().any(|a| a == "--newline"));
        assert_eq!(
            args.last().and_then(|a| a.to_str()),
            Some("https://www.youtube.com/watch?v=AAAAAAAAAAA")
        );
    }

    #[test]
    fn best_quality_selects_merged_mp4() {
        let args = download_args(
            "t",
            Quality::Best,
            &DEFAULT_IDENTITIES[0],
            Path::new("d"),
            &ToolConfig::default(),
        );
        assert_eq!(
            value_after(&args, "-f"),
            Some("bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best")
        );
    }

    #[test]
    fn title_args_skip_download() {
        let args = title_args("t", &DEFAULT_IDENTITIES[0], &ToolConfig::default());
        assert!(args.iter().any(|a| a == "--skip-download"));
        assert_eq!(value_after(&args, "--print"), Some("title"));
        assert_eq!(
            value_after(&args, "--extractor-args"),
            Some("youtube:player_client=android")
        );
        assert!(!args.iter().any(|a| a == "-o"));
    }
}
