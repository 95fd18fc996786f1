//! Naming of the instrumented output file.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Returns the sibling of `input` named `<stem><suffix><.extension>`.
///
/// Only the last extension is kept apart, so `shader.glsl.c` becomes
/// `shader.glsl_instrumented.c`.
pub(crate) fn output_path(input: &Path, suffix: &str) -> PathBuf {
    let mut name = input
        .file_stem()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(suffix);
    if let Some(extension) = input.extension() {
        name.push(".");
        name.push(extension);
    }
    input.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("device.c", "device_instrumented.c")]
    #[case("src/wgvk.c", "src/wgvk_instrumented.c")]
    #[case("/abs/path/queue.h", "/abs/path/queue_instrumented.h")]
    #[case("shader.glsl.c", "shader.glsl_instrumented.c")]
    #[case("Makefile", "Makefile_instrumented")]
    fn output_sits_next_to_the_input(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(
            output_path(Path::new(input), "_instrumented"),
            PathBuf::from(expected)
        );
    }

    #[test]
    fn suffix_is_configurable() {
        assert_eq!(
            output_path(Path::new("device.c"), ".traced"),
            PathBuf::from("device.traced.c")
        );
    }
}
