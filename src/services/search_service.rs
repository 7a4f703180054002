use crate::database::MongoDB;
use crate::models::{Recipe, RecipeSummary, DIFFICULTIES};
use crate::services::user_service;
use crate::utils::error::AppError;
use crate::utils::pagination::{self, Pagination};
use futures::stream::TryStreamExt;
use mongodb::bson::doc;
use serde::Deserialize;
use std::cmp::Ordering;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub tag: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<i64>,
    pub page: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Relevance,
    Title,
    Created,
    Rating,
}

impl SortKey {
    fn parse(value: Option<&str>) -> Result<Self, AppError> {
        match value {
            None | Some("relevance") => Ok(SortKey::Relevance),
            Some("title") => Ok(SortKey::Title),
            Some("created") => Ok(SortKey::Created),
            Some("rating") => Ok(SortKey::Rating),
            Some(other) => Err(AppError::Validation(format!(
                "Invalid sort key '{}'. Must be one of: relevance, title, created, rating",
                other
            ))),
        }
    }
}

struct ValidatedSearch {
    query: String,
    category: Option<String>,
    difficulty: Option<String>,
    tag: Option<String>,
    sort: SortKey,
    limit: i64,
    page: i64,
}

/// Filter values are allow-listed before any query is constructed; the
/// search route is a trust boundary like every other.
fn validate(query: &SearchQuery) -> Result<ValidatedSearch, AppError> {
    let q = query.q.trim();
    // Character count, not byte length
    if q.chars().count() < 2 {
        return Err(AppError::Validation(
            "Search query must be at least 2 characters".to_string(),
        ));
    }

    if let Some(difficulty) = &query.difficulty {
        if !DIFFICULTIES.contains(&difficulty.as_str()) {
            return Err(AppError::Validation(format!(
                "Invalid difficulty filter. Must be one of: {}",
                DIFFICULTIES.join(", ")
            )));
        }
    }

    for (name, value) in [("category", &query.category), ("tag", &query.tag)] {
        if let Some(value) = value {
            if value.trim().is_empty() || value.chars().count() > 64 {
                return Err(AppError::Validation(format!(
                    "Invalid {} filter: must be between 1 and 64 characters",
                    name
                )));
            }
        }
    }

    Ok(ValidatedSearch {
        query: q.to_string(),
        category: query.category.clone(),
        difficulty: query.difficulty.clone(),
        tag: query.tag.clone(),
        sort: SortKey::parse(query.sort.as_deref())?,
        limit: pagination::clamp_limit(query.limit),
        page: pagination::clamp_page(query.page),
    })
}

/// Escape user input so it matches literally inside a $regex.
fn escape_regex(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(
            c,
            '.' | '^' | '$' | '*' | '+' | '?' | '(' | ')' | '[' | ']' | '{' | '}' | '|' | '\\'
        ) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Relevance tiers: exact-prefix title match, then substring title match,
/// then prefix description match, then everything else.
fn relevance_tier(recipe: &Recipe, query_lower: &str) -> u8 {
    let title = recipe.title.to_lowercase();
    if title.starts_with(query_lower) {
        0
    } else if title.contains(query_lower) {
        1
    } else if recipe.description.to_lowercase().starts_with(query_lower) {
        2
    } else {
        3
    }
}

/// Descending average rating, unrated entries last
fn cmp_rating_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn sort_results(recipes: &mut [Recipe], sort: SortKey, query_lower: &str) {
    match sort {
        SortKey::Relevance => {
            recipes.sort_by(|a, b| {
                relevance_tier(a, query_lower)
                    .cmp(&relevance_tier(b, query_lower))
                    .then_with(|| cmp_rating_desc(a.avg_rating, b.avg_rating))
                    .then_with(|| b.created_at.cmp(&a.created_at))
            });
        }
        SortKey::Title => {
            recipes.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()));
        }
        SortKey::Created => {
            recipes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        }
        SortKey::Rating => {
            recipes.sort_by(|a, b| {
                cmp_rating_desc(a.avg_rating, b.avg_rating)
                    .then_with(|| b.created_at.cmp(&a.created_at))
            });
        }
    }
}

/// Full-text recipe search: case-insensitive substring match on title,
/// description, and instructions, optional ANDed filters, ranked and paged.
/// Only published recipes are eligible.
pub async fn search(
    db: &MongoDB,
    query: &SearchQuery,
) -> Result<(Vec<RecipeSummary>, Pagination), AppError> {
    let validated = validate(query)?;

    let pattern = escape_regex(&validated.query);
    let regex = doc! { "$regex": &pattern, "$options": "i" };

    let mut filter = doc! {
        "is_published": true,
        "$or": [
            { "title": regex.clone() },
            { "description": regex.clone() },
            { "instructions": regex },
        ]
    };
    if let Some(category) = &validated.category {
        filter.insert("category", category);
    }
    if let Some(difficulty) = &validated.difficulty {
        filter.insert("difficulty", difficulty);
    }
    if let Some(tag) = &validated.tag {
        filter.insert("tags", tag);
    }

    let mut matches: Vec<Recipe> = db
        .collection::<Recipe>("recipes")
        .find(filter)
        .await?
        .try_collect()
        .await?;

    let query_lower = validated.query.to_lowercase();
    sort_results(&mut matches, validated.sort, &query_lower);

    let total_count = matches.len() as i64;
    let offset = ((validated.page - 1) * validated.limit) as usize;
    let page_items: Vec<Recipe> = matches
        .into_iter()
        .skip(offset)
        .take(validated.limit as usize)
        .collect();

    let author_ids: Vec<String> = page_items.iter().map(|r| r.user_id.clone()).collect();
    let authors = user_service::author_map(db, &author_ids).await?;

    let summaries = page_items
        .into_iter()
        .map(|recipe| {
            let author = authors.get(&recipe.user_id).cloned();
            RecipeSummary::from_recipe(recipe, author)
        })
        .collect();

    Ok((
        summaries,
        Pagination::build(validated.page, validated.limit, total_count),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe(title: &str, description: &str, avg_rating: Option<f64>, created_at: i64) -> Recipe {
        Recipe {
            id: None,
            user_id: "user-1".to_string(),
            title: title.to_string(),
            description: description.to_string(),
            instructions: String::new(),
            category: None,
            difficulty: None,
            tags: vec![],
            prep_time_minutes: None,
            cook_time_minutes: None,
            servings: None,
            image_url: None,
            is_published: true,
            avg_rating,
            rating_count: 0,
            created_at,
            updated_at: created_at,
        }
    }

    fn query(q: &str) -> SearchQuery {
        SearchQuery {
            q: q.to_string(),
            category: None,
            difficulty: None,
            tag: None,
            sort: None,
            limit: None,
            page: None,
        }
    }

    #[test]
    fn test_short_query_rejected_before_any_db_work() {
        assert!(validate(&query("a")).is_err());
        // Whitespace does not count toward the minimum length
        assert!(validate(&query("  a  ")).is_err());
        assert!(validate(&query("ab")).is_ok());
    }

    #[test]
    fn test_length_gate_counts_characters_not_bytes() {
        // One two-byte character is still one character
        assert!(validate(&query("é")).is_err());
        assert!(validate(&query("éé")).is_ok());

        let mut multibyte_tag = query("pasta");
        multibyte_tag.tag = Some("é".repeat(64));
        assert!(validate(&multibyte_tag).is_ok());
    }

    #[test]
    fn test_invalid_filters_rejected() {
        let mut bad_difficulty = query("pasta");
        bad_difficulty.difficulty = Some("expert".to_string());
        assert!(validate(&bad_difficulty).is_err());

        let mut long_tag = query("pasta");
        long_tag.tag = Some("x".repeat(65));
        assert!(validate(&long_tag).is_err());

        let mut bad_sort = query("pasta");
        bad_sort.sort = Some("price".to_string());
        assert!(validate(&bad_sort).is_err());
    }

    #[test]
    fn test_limit_is_clamped_to_50() {
        let mut oversized = query("pasta");
        oversized.limit = Some(500);
        let validated = validate(&oversized).unwrap();
        assert_eq!(validated.limit, 50);
    }

    #[test]
    fn test_escape_regex_neutralizes_metacharacters() {
        assert_eq!(escape_regex("a.b*c"), "a\\.b\\*c");
        assert_eq!(escape_regex("(pie)"), "\\(pie\\)");
        assert_eq!(escape_regex("plain"), "plain");
    }

    #[test]
    fn test_relevance_tiers() {
        let q = "tomato";
        assert_eq!(relevance_tier(&recipe("Tomato soup", "", None, 0), q), 0);
        assert_eq!(relevance_tier(&recipe("Roast tomato tart", "", None, 0), q), 1);
        assert_eq!(
            relevance_tier(&recipe("Red sauce", "Tomato base for pasta", None, 0), q),
            2
        );
        assert_eq!(
            relevance_tier(&recipe("Red sauce", "A rich tomato base", None, 0), q),
            3
        );
    }

    #[test]
    fn test_relevance_sort_orders_tiers_then_rating() {
        let mut recipes = vec![
            recipe("Red sauce", "A rich tomato base", None, 5),     // tier 3
            recipe("Roast tomato tart", "", Some(3.0), 4),          // tier 1
            recipe("Tomato soup", "", None, 1),                     // tier 0, unrated
            recipe("Tomato confit", "", Some(4.5), 2),              // tier 0, rated
        ];
        sort_results(&mut recipes, SortKey::Relevance, "tomato");

        let titles: Vec<&str> = recipes.iter().map(|r| r.title.as_str()).collect();
        // Within tier 0 the rated recipe outranks the unrated one
        assert_eq!(
            titles,
            vec!["Tomato confit", "Tomato soup", "Roast tomato tart", "Red sauce"]
        );
    }

    #[test]
    fn test_rating_sort_puts_unrated_last() {
        let mut recipes = vec![
            recipe("A", "", None, 3),
            recipe("B", "", Some(2.0), 2),
            recipe("C", "", Some(4.0), 1),
        ];
        sort_results(&mut recipes, SortKey::Rating, "");
        let titles: Vec<&str> = recipes.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["C", "B", "A"]);
    }

    #[test]
    fn test_title_sort_is_case_insensitive() {
        let mut recipes = vec![
            recipe("banana bread", "", None, 0),
            recipe("Apple pie", "", None, 0),
        ];
        sort_results(&mut recipes, SortKey::Title, "");
        assert_eq!(recipes[0].title, "Apple pie");
    }
}
