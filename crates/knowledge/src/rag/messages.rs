//! Built-in canned responses per answer language.

const NO_RESULTS_JA: &str =
    "該当する情報が見つかりませんでした。より具体的なキーワードで検索してみてください。";
const NO_RESULTS_EN: &str =
    "No matching information was found. Try searching with more specific keywords.";

const APOLOGY_JA: &str = "申し訳ございませんが、回答の生成中にエラーが発生しました。";
const APOLOGY_EN: &str = "Sorry, an error occurred while generating the answer.";

/// Message returned when retrieval finds nothing.
pub fn no_results(language: &str) -> &'static str {
    match language {
        "en" => NO_RESULTS_EN,
        _ => NO_RESULTS_JA,
    }
}

/// Message returned when the model call fails.
pub fn apology(language: &str) -> &'static str {
    match language {
        "en" => APOLOGY_EN,
        _ => APOLOGY_JA,
    }
}
