//! Stand-in `yt-dlp` executable for integration tests.
//!
//! A POSIX shell script that answers `--dump-json` with a fixed document and
//! otherwise writes `Fake Clip.mp4` next to the `-o` template, printing the
//! same tagged lines the real engine prints for our progress template. URLs
//! containing `fail.example` exit non-zero with an `ERROR:` line.
//! `latin1.example` adds non-UTF-8 output to a successful run, and
//! `badbytes.example` fails with a non-UTF-8 error line.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tempfile::TempDir;

const SCRIPT: &str = r#"#!/bin/sh
out=""
dump=0
prev=""
for a in "$@"; do
  if [ "$prev" = "-o" ]; then out="$a"; fi
  if [ "$a" = "--dump-json" ]; then dump=1; fi
  prev="$a"
done
case "$*" in
  *fail.example*)
    echo "WARNING: retrying" >&2
    echo "ERROR: [generic] Unsupported URL: https://fail.example/x" >&2
    exit 1
    ;;
esac
if [ "$dump" = 1 ]; then
  echo '{"title":"Fake Clip","uploader":"Tester","duration":125,"view_count":4200,"webpage_url":"https://example.com/watch?v=1","formats":[{"height":360,"ext":"mp4"},{"height":720,"ext":"mp4"},{"height":720,"ext":"webm"},{"ext":"m4a"}]}'
  exit 0
fi
dir=$(dirname "$out")
mkdir -p "$dir"
echo "[youtube] Extracting URL"
case "$*" in
  *latin1.example*)
    printf '[ffmpeg] Merging \377\376 formats\n' >&2
    printf 'Caf\351 title\n'
    ;;
  *badbytes.example*)
    printf 'ERROR: broken \377 stream\n' >&2
    exit 1
    ;;
esac
echo 'VIDZ_PROGRESS {"status":"downloading","downloaded_bytes":512,"total_bytes":null,"total_bytes_estimate":1024,"speed":256.0,"eta":2}' >&2
printf 'fake media' > "$dir/Fake Clip.mp4"
echo 'VIDZ_PROGRESS {"status":"finished","downloaded_bytes":1024,"total_bytes":1024,"filename":"'"$dir"'/Fake Clip.mp4"}' >&2
echo "VIDZ_TITLE Fake Clip"
echo "VIDZ_FILE $dir/Fake Clip.mp4"
"#;

static SCRIPT_DIR: OnceLock<TempDir> = OnceLock::new();

/// Path of the fake executable. Written once per test binary, before any test
/// spawns a child, so no child inherits an open write handle to it.
pub fn path() -> PathBuf {
    let dir = SCRIPT_DIR.get_or_init(|| {
        let dir = tempfile::tempdir().expect("tempdir");
        install(dir.path());
        dir
    });
    dir.path().join("yt-dlp")
}

fn install(dir: &Path) {
    let path = dir.join("yt-dlp");
    fs::write(&path, SCRIPT).expect("write script");
    let mut perms = fs::metadata(&path).expect("stat script").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("chmod script");
}
