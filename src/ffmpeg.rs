use crate::error::MediaError;
use crate::logi;
use crate::quote::{center, LINE_WIDTH};
use anyhow::{Context, Result};
use std::path::Path;
use tokio::process::Command;

/// Approximate width of one leading space, in pixels.
const SPACE_WIDTH: f64 = 1.1;
const LINE_HEIGHT: u32 = 20;
const BASE_Y: u32 = 100;
const TEMPLATE_FONT_SIZE: u32 = 20;

pub(crate) async fn run_cmd(args: &[String]) -> Result<()> {
    if args.is_empty() {
        return Ok(());
    }

    logi(format!("Executing: {}", args.join(" ")));

    let mut cmd = Command::new(&args[0]);
    if args.len() > 1 {
        cmd.args(&args[1..]);
    }

    let output = cmd
        .output()
        .await
        .with_context(|| format!("Failed to execute {}", args[0]))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(MediaError::ToolFailed {
            tool: args[0].clone(),
            detail: if stderr.is_empty() {
                format!("exit status {}", output.status)
            } else {
                stderr
            },
        }
        .into());
    }

    Ok(())
}

/// Whether `tool` can be started and reports a version.
pub async fn check_tool(tool: &str, version_flag: &str) -> bool {
    match Command::new(tool).arg(version_flag).output().await {
        Ok(output) => output.status.success(),
        Err(_) => false,
    }
}

pub async fn ffprobe_duration_seconds(path: &Path) -> Result<f64> {
    if !path.is_file() {
        return Err(MediaError::FileNotFound(path.to_path_buf()).into());
    }

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .output()
        .await
        .context("ffprobe duration failed")?;

    if !output.status.success() {
        return Err(MediaError::ToolFailed {
            tool: "ffprobe".into(),
            detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
        .into());
    }

    parse_duration(&String::from_utf8_lossy(&output.stdout))
        .ok_or_else(|| MediaError::NoDuration(path.to_path_buf()).into())
}

fn parse_duration(stdout: &str) -> Option<f64> {
    stdout.trim().parse::<f64>().ok().filter(|d| d.is_finite() && *d >= 0.0)
}

/// Escapes text for a single-quoted drawtext value.
fn escape_drawtext(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace(':', "\\:")
        .replace('%', "\\%")
}

/// Builds one drawtext filter per formatted line, chained with commas.
///
/// Each line is drawn centred on the frame and then nudged right by the
/// number of leading spaces it carried, so the layout from
/// [`crate::quote::format_quote`] survives ffmpeg's own centring.
pub fn drawtext_filters(lines: &[String], font_path: &Path) -> String {
    let font = font_path.display().to_string();
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let line = center(line.trim_end_matches('\n'), LINE_WIDTH).replace('\'', "");
            let leading = line.chars().take_while(|c| c.is_whitespace()).count();
            let x_offset = leading as f64 * SPACE_WIDTH;
            let y = BASE_Y + i as u32 * LINE_HEIGHT;
            format!(
                "drawtext=fontfile={}:text='{}':fontcolor=black:fontsize={}:x=((w-text_w)/2)+{}:y={}",
                font,
                escape_drawtext(&line),
                TEMPLATE_FONT_SIZE,
                x_offset,
                y
            )
        })
        .collect::<Vec<_>>()
        .join(",")
}

pub fn overlay_template_args(template: &Path, filters: &str, out_mp4: &Path) -> Vec<String> {
    vec![
        "ffmpeg".to_string(),
        "-i".to_string(),
        template.display().to_string(),
        "-vf".to_string(),
        filters.to_string(),
        "-codec:a".to_string(),
        "copy".to_string(),
        "-y".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        out_mp4.display().to_string(),
    ]
}

pub async fn ffmpeg_overlay_template(template: &Path, filters: &str, out_mp4: &Path) -> Result<bool> {
    run_cmd(&overlay_template_args(template, filters, out_mp4)).await?;
    Ok(out_mp4.exists())
}

pub fn still_with_audio_args(image: &Path, audio: &Path, duration_s: u32, out_mp4: &Path) -> Vec<String> {
    vec![
        "ffmpeg".to_string(),
        "-loop".to_string(),
        "1".to_string(),
        "-i".to_string(),
        image.display().to_string(),
        "-i".to_string(),
        audio.display().to_string(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-t".to_string(),
        duration_s.to_string(),
        "-pix_fmt".to_string(),
        "yuvj420p".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-y".to_string(),
        out_mp4.display().to_string(),
    ]
}

pub async fn ffmpeg_still_with_audio(
    image: &Path,
    audio: &Path,
    duration_s: u32,
    out_mp4: &Path,
) -> Result<bool> {
    run_cmd(&still_with_audio_args(image, audio, duration_s, out_mp4)).await?;
    Ok(out_mp4.exists())
}

pub fn trim_head_args(input: &Path, skip_s: f64, keep_s: u32, out: &Path) -> Vec<String> {
    vec![
        "ffmpeg".to_string(),
        "-i".to_string(),
        input.display().to_string(),
        "-ss".to_string(),
        format!("{:.3}", skip_s),
        "-t".to_string(),
        keep_s.to_string(),
        "-c".to_string(),
        "copy".to_string(),
        out.display().to_string(),
        "-y".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
    ]
}

/// Drops the first `skip_s` seconds of `input` and keeps `keep_s` seconds.
pub async fn ffmpeg_trim_head(input: &Path, skip_s: f64, keep_s: u32, out: &Path) -> Result<bool> {
    run_cmd(&trim_head_args(input, skip_s, keep_s, out)).await?;
    Ok(out.exists())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quote::format_quote;
    use std::path::PathBuf;

    #[test]
    fn one_filter_per_line_with_stepped_y() {
        let lines = format_quote("a b c d e f g h");
        let filters = drawtext_filters(&lines, Path::new("Roboto-Medium.ttf"));
        let parts: Vec<&str> = filters.split(",drawtext=").collect();
        assert_eq!(parts.len(), 2);
        assert!(parts[0].starts_with("drawtext=fontfile=Roboto-Medium.ttf:text='"));
        assert!(parts[0].ends_with(":y=100"));
        assert!(parts[1].ends_with(":y=120"));
        assert!(!filters.contains('\n'));
    }

    #[test]
    fn offset_tracks_leading_spaces() {
        // "h" centred in 40 columns has 19 leading spaces.
        let filters = drawtext_filters(&["h".to_string()], Path::new("f.ttf"));
        let expected = format!("x=((w-text_w)/2)+{}:y=100", 19.0 * SPACE_WIDTH);
        assert!(filters.ends_with(&expected), "{filters}");
    }

    #[test]
    fn apostrophes_dropped_and_specials_escaped() {
        let filters = drawtext_filters(&["It's 50% at 5:00".to_string()], Path::new("f.ttf"));
        assert!(filters.contains("Its 50\\% at 5\\:00"));
        assert!(!filters.contains("It's"));
    }

    #[test]
    fn template_args_copy_audio_and_overwrite() {
        let args = overlay_template_args(
            Path::new("Templates/t.mp4"),
            "drawtext=x",
            Path::new("Videos/q_video.mp4"),
        );
        let vf = args.iter().position(|a| a == "-vf").unwrap();
        assert_eq!(args[vf + 1], "drawtext=x");
        assert!(args.windows(2).any(|w| w[0] == "-codec:a" && w[1] == "copy"));
        assert_eq!(args.last().map(String::as_str), Some("Videos/q_video.mp4"));
    }

    #[test]
    fn still_args_loop_image_for_duration() {
        let out = PathBuf::from("Videos/pic_video.mp4");
        let args = still_with_audio_args(Path::new("pic.jpg"), Path::new("song.mp3"), 25, &out);
        assert_eq!(&args[1..3], &["-loop".to_string(), "1".to_string()]);
        assert!(args.windows(2).any(|w| w[0] == "-t" && w[1] == "25"));
        assert!(args.windows(2).any(|w| w[0] == "-pix_fmt" && w[1] == "yuvj420p"));
    }

    #[test]
    fn trim_args_seek_after_input() {
        let args = trim_head_args(Path::new("a.mp3"), 1.5, 22, Path::new("trimmed_a.mp3"));
        let input = args.iter().position(|a| a == "-i").unwrap();
        let seek = args.iter().position(|a| a == "-ss").unwrap();
        assert!(seek > input);
        assert_eq!(args[seek + 1], "1.500");
    }

    #[test]
    fn duration_parsing() {
        assert_eq!(parse_duration("22.031\n"), Some(22.031));
        assert_eq!(parse_duration("N/A"), None);
        assert_eq!(parse_duration(""), None);
    }
}
