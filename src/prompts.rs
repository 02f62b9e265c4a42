use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Language the commentary is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[value(name = "en")]
    #[serde(rename = "en")]
    English,
    #[value(name = "ja")]
    #[serde(rename = "ja")]
    Japanese,
}

impl Language {
    /// Fixed sentence posted when commentary could not be generated.
    pub fn placeholder(self) -> &'static str {
        match self {
            Language::English => "Analysis of this story could not be generated.",
            Language::Japanese => "ニュース分析の生成に失敗しました。",
        }
    }
}

pub fn commentary(language: Language, title: &str, summary: &str, max_chars: usize) -> String {
    match language {
        Language::English => format!(
            r#"Read the news article below and write a short post for X (Twitter) that analyses it the way a domain expert would.

CONSTRAINTS:
- At most {max} characters.
- Plain text only: no emoji, no hashtags, no links.
- One or two sentences of analysis, not a restatement of the headline.

TITLE: {title}
SUMMARY: {summary}

POST:"#,
            max = max_chars,
            title = title,
            summary = summary
        ),
        Language::Japanese => format!(
            r#"次のニュース記事を専門家の視点で簡潔に分析し、X (Twitter) に投稿する日本語の文章を書いてください。

条件:
- {max}文字以内。
- 絵文字、ハッシュタグ、URLは含めない。
- 見出しの言い換えではなく、一言の分析を添える。

記事タイトル: {title}
記事概要: {summary}

投稿文:"#,
            max = max_chars,
            title = title,
            summary = summary
        ),
    }
}

/// Image descriptions are always requested in English.
pub fn image_description(title: &str, summary: &str) -> String {
    format!(
        r#"Describe, in one sentence of at most 40 words, an illustration that would accompany the news article below.

CONSTRAINTS:
- Describe only visual elements: setting, objects, mood, style.
- No text, letters, logos or recognisable real people in the image.

TITLE: {title}
SUMMARY: {summary}

DESCRIPTION:"#,
        title = title,
        summary = summary
    )
}
