#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Ping,
    ParseDocument,
    ParseTranslations,
    GenerateTranslation,
    TranslationFilename,
    DetectEncoding,
    Unknown,
}

impl From<&str> for Command {
    fn from(s: &str) -> Self {
        match s {
            "ping" => Command::Ping,
            "parse_document" => Command::ParseDocument,
            "parse_translations" => Command::ParseTranslations,
            "generate_translation" => Command::GenerateTranslation,
            "translation_filename" => Command::TranslationFilename,
            "encoding.detect" | "detect_encoding" => Command::DetectEncoding,
            _ => Command::Unknown,
        }
    }
}
