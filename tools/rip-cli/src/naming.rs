//! Output file naming

use nether_rip::Sample;

/// Characters kept in file names besides ASCII alphanumerics
const KEEP_CHARACTERS: [char; 4] = [' ', '.', '_', '-'];

/// File stem for a sample: `"{number}"` or `"{number} - {name}"`
///
/// Non-printable characters are dropped from the name first; characters
/// that are not safe in file names are then dropped from the whole stem and
/// trailing spaces trimmed.
pub fn sample_file_stem(number: usize, name: &str) -> String {
    let printable: String = name
        .chars()
        .filter(|c| c.is_ascii_graphic() || c.is_ascii_whitespace())
        .collect();

    let mut stem = number.to_string();
    if !printable.is_empty() {
        stem.push_str(" - ");
        stem.push_str(&printable);
    }

    let cleaned: String = stem
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || KEEP_CHARACTERS.contains(c))
        .collect();
    cleaned.trim_end().to_string()
}

/// WAV file name for a sample
pub fn sample_file_name(sample: &Sample) -> String {
    format!("{}.wav", sample_file_stem(sample.number, &sample.name))
}
