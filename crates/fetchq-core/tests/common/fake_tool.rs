//! Shell-script stand-ins for the external extraction tool.
//!
//! Every script starts with the same preamble: it parses `-o`,
//! `--extractor-args` and `--skip-download`, sets `$dir`, `$client` and
//! `$mode`, and appends `<mode>:<client>` to `invocations.log` next to itself.
//! The body decides what happens next.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

const LOG_NAME: &str = "invocations.log";
const EVENTS_NAME: &str = "events.log";

const PREAMBLE: &str = r#"#!/bin/sh
out=""
client=""
mode="dl"
while [ $# -gt 0 ]; do
  case "$1" in
    -o) out="$2"; shift 2 ;;
    --extractor-args) client="${2#*player_client=}"; shift 2 ;;
    --skip-download) mode="title"; shift ;;
    *) shift ;;
  esac
done
dir=$(dirname "$out")
"#;

/// Writes the script into `dir` and returns its path.
pub fn write(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("fake-fetch-tool");
    let log = dir.join(LOG_NAME);
    let script = format!(
        "{PREAMBLE}echo \"$mode:$client\" >> \"{}\"\n{body}\n",
        log.display()
    );
    fs::write(&path, script).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

pub fn invocations(dir: &Path) -> Vec<String> {
    fs::read_to_string(dir.join(LOG_NAME))
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

/// Rejects every identity except `winner`, which downloads "Sample Clip.mp4".
pub fn succeed_only_for(winner: &str) -> String {
    format!(
        r#"if [ "$client" = "{winner}" ]; then
  echo "[info] Sample Clip"
  echo "[download]  10.0% of 1.00MiB at 500.00KiB/s ETA 00:02"
  echo "[download]  55.5% of 1.00MiB at 1.20MiB/s ETA 00:01"
  echo "[download] 100% of 1.00MiB in 00:01"
  printf 'media' > "$dir/Sample Clip.mp4"
  exit 0
fi
echo "ERROR: [youtube] AAAAAAAAAAA: HTTP Error 403: Forbidden" >&2
exit 1"#
    )
}

/// Every identity is rejected; stderr names the identity.
pub const REJECT_ALL: &str = r#"echo "ERROR: client $client rejected: HTTP Error 403: Forbidden" >&2
exit 1"#;

/// Exits 0 without producing anything.
pub const NO_OUTPUT: &str = "exit 0";

/// Reports 5% then hangs until killed.
pub const HANG_AFTER_START: &str = r#"echo "[download]   5.0% of 10.00MiB at 1.00MiB/s ETA 00:09"
exec sleep 30"#;

/// Quick success with a per-process file name. Holds `$dir/.busy` while it
/// runs and exits 97 if another download already holds it.
pub const QUICK_SUCCESS: &str = r#"if ! mkdir "$dir/.busy" 2>/dev/null; then
  echo "overlapping download detected" >&2
  exit 97
fi
echo "[download]  50.0% of 1.00KiB at 1.00KiB/s ETA 00:00"
sleep 0.05
printf 'media' > "$dir/clip-$$.mp4"
rmdir "$dir/.busy"
exit 0"#;

/// Title lookups log `start`/`end` to `events.log` around a short sleep.
pub const SLOW_TITLE: &str = r#"if [ "$mode" = "title" ]; then
  events="$(dirname "$0")/events.log"
  echo start >> "$events"
  sleep 0.3
  echo end >> "$events"
  echo "Slow Title"
  exit 0
fi
exec sleep 30"#;

/// Highest number of `start`s without a matching `end` seen in `events.log`,
/// plus the total number of starts.
pub fn overlap(dir: &Path) -> (usize, usize) {
    let events = fs::read_to_string(dir.join(EVENTS_NAME)).unwrap_or_default();
    let (mut running, mut max, mut starts) = (0usize, 0usize, 0usize);
    for line in events.lines() {
        match line.trim() {
            "start" => {
                starts += 1;
                running += 1;
                max = max.max(running);
            }
            "end" => running = running.saturating_sub(1),
            _ => {}
        }
    }
    (max, starts)
}

/// Title probe answers with "Probed Title"; downloads hang.
pub const TITLE_THEN_HANG: &str = r#"if [ "$mode" = "title" ]; then
  echo "Probed Title"
  exit 0
fi
exec sleep 30"#;
