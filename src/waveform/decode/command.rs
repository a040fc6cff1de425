use std::ffi::OsString;
use std::path::Path;

use super::DecodeRequest;

/// Arguments for `ffmpeg -i <input> [-t <secs>] -f s16le -ac <n> -ar <rate> -y <output>`.
///
/// The reducer assumes exactly this output format.
pub(super) fn ffmpeg_args(request: &DecodeRequest, output: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-hide_banner".into(), "-nostdin".into()];
    args.push("-i".into());
    args.push(request.source.clone().into_os_string());
    if let Some(limit) = request.prefix_limit {
        args.push("-t".into());
        args.push(format!("{:.3}", limit.as_secs_f64()).into());
    }
    args.extend(
        [
            "-f".to_string(),
            "s16le".to_string(),
            "-ac".to_string(),
            request.channels.max(1).to_string(),
            "-ar".to_string(),
            request.sample_rate.to_string(),
            "-y".to_string(),
        ]
        .map(OsString::from),
    );
    args.push(output.as_os_str().to_os_string());
    args
}
