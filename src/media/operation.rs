//! Operation selector and the fixed ffmpeg argument templates.

use std::ffi::OsString;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Codec used by `compress_video`
const VIDEO_CODEC: &str = "libx264";
/// Constant rate factor used by `compress_video`
const VIDEO_CRF: &str = "28";
/// JPEG-style quality scale used by `compress_image`
const IMAGE_QSCALE: &str = "5";

/// Caller-selected processing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Re-encode into whatever container the output extension implies
    Convert,
    CompressVideo,
    CompressImage,
}

/// Returned when the `operation` form field names no known operation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown operation '{0}'")]
pub struct UnknownOperation(pub String);

impl Operation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Convert => "convert",
            Self::CompressVideo => "compress_video",
            Self::CompressImage => "compress_image",
        }
    }

    /// Build the tool arguments (without the program itself)
    pub fn args(self, input: &Path, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-y".into(), "-i".into(), input.into()];
        match self {
            Self::Convert => {}
            Self::CompressVideo => {
                args.extend(["-vcodec", VIDEO_CODEC, "-crf", VIDEO_CRF].map(OsString::from));
            }
            Self::CompressImage => {
                args.extend(["-qscale:v", IMAGE_QSCALE].map(OsString::from));
            }
        }
        args.push(output.into());
        args
    }
}

impl FromStr for Operation {
    type Err = UnknownOperation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "convert" => Ok(Self::Convert),
            "compress_video" => Ok(Self::CompressVideo),
            "compress_image" => Ok(Self::CompressImage),
            other => Err(UnknownOperation(other.to_string())),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_of(op: Operation) -> Vec<String> {
        op.args(Path::new("uploads/in.mov"), Path::new("processed/in_converted.mp4"))
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_convert_template() {
        assert_eq!(
            args_of(Operation::Convert),
            ["-y", "-i", "uploads/in.mov", "processed/in_converted.mp4"]
        );
    }

    #[test]
    fn test_compress_video_template() {
        assert_eq!(
            args_of(Operation::CompressVideo),
            [
                "-y",
                "-i",
                "uploads/in.mov",
                "-vcodec",
                "libx264",
                "-crf",
                "28",
                "processed/in_converted.mp4"
            ]
        );
    }

    #[test]
    fn test_compress_image_template() {
        assert_eq!(
            args_of(Operation::CompressImage),
            [
                "-y",
                "-i",
                "uploads/in.mov",
                "-qscale:v",
                "5",
                "processed/in_converted.mp4"
            ]
        );
    }

    #[test]
    fn test_parse_known_operations() {
        for op in [
            Operation::Convert,
            Operation::CompressVideo,
            Operation::CompressImage,
        ] {
            assert_eq!(op.as_str().parse::<Operation>(), Ok(op));
            assert_eq!(op.to_string(), op.as_str());
        }
    }

    #[test]
    fn test_parse_rejects_unknown_and_case_variants() {
        assert_eq!(
            "bogus".parse::<Operation>(),
            Err(UnknownOperation("bogus".to_string()))
        );
        assert!("Convert".parse::<Operation>().is_err());
        assert!(" convert".parse::<Operation>().is_err());
        assert!("".parse::<Operation>().is_err());
    }
}
