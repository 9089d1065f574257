//! Prompt construction for event synthesis.

use globefeed_core::NewsItem;

/// Build the single prompt instructing the model to emit a JSON array of
/// market events for `items`.
///
/// The schema and scoring rubric are spelled out verbatim so the strict
/// parser can hold the model to them.
#[must_use]
pub fn build_events_prompt(items: &[NewsItem]) -> String {
    let mut articles = String::new();
    for (i, item) in items.iter().enumerate() {
        let symbols = if item.symbols.is_empty() {
            "none".to_string()
        } else {
            item.symbols.join(", ")
        };
        articles.push_str(&format!(
            "Article {n}:\n\
             - title: {title}\n\
             - description: {description}\n\
             - url: {url}\n\
             - published_at: {published}\n\
             - symbols: {symbols}\n\n",
            n = i + 1,
            title = item.title,
            description = item.description,
            url = item.url,
            published = item.published_at.to_rfc3339(),
            symbols = symbols,
        ));
    }

    format!(
        "You are a financial analyst. Convert each news article below into a market \
         event JSON object. Respond with ONLY a JSON array, no prose and no Markdown.\n\n\
         Each element must have exactly these fields:\n\
         {{\n\
           \"title\": string,\n\
           \"summary\": string (one or two sentences),\n\
           \"category\": string,\n\
           \"article_link\": string (the article url, copied verbatim),\n\
           \"image_url\": string or null,\n\
           \"coordinates\": {{ \"lat\": number, \"lng\": number }} (where the event is centered),\n\
           \"country_code\": ISO-2 string or null,\n\
           \"impact_score\": integer 0-100,\n\
           \"relevant_stocks\": [ {{ \"ticker\": string, \"name\": string }} ] (at least one),\n\
           \"event_date\": ISO 8601 date-time string\n\
         }}\n\n\
         Scoring rubric: 0-29 means minor/local impact, 30-69 means notable \
         sector or regional impact, 70-100 means major market-moving impact.\n\n\
         {articles}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use globefeed_core::Category;

    #[test]
    fn prompt_embeds_every_article_url() {
        let items: Vec<NewsItem> = (0..3)
            .map(|i| NewsItem {
                id: format!("t-{i}"),
                title: format!("Title {i}"),
                description: String::new(),
                url: format!("https://example.com/{i}"),
                published_at: Utc::now(),
                source: "test".to_string(),
                category: Category::Market,
                sentiment: None,
                symbols: Vec::new(),
                image_url: None,
            })
            .collect();
        let prompt = build_events_prompt(&items);
        for item in &items {
            assert!(prompt.contains(&item.url), "missing {}", item.url);
        }
        assert!(prompt.contains("impact_score"));
        assert!(prompt.contains("0-100"));
    }
}
