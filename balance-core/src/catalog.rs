use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::balance::question_key;
use crate::category::Category;
use crate::error::CatalogError;
use crate::weighting::QuestionWeighting;

/// A survey question. Category assignment is static reference data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Question {
    pub id: String,
    pub category: Category,
    pub text: Option<String>,
    #[serde(default)]
    pub weighting: QuestionWeighting,
}

/// Catalog file entry. Categories may be given as keys or display names.
#[derive(Debug, Deserialize)]
struct RawQuestion {
    id: String,
    category: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    weighting: QuestionWeighting,
}

/// The static list of survey questions, indexed by id.
#[derive(Debug, Clone, Default)]
pub struct QuestionCatalog {
    questions: Vec<Question>,
    index: HashMap<String, usize>,
}

impl QuestionCatalog {
    pub fn new(questions: Vec<Question>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(questions.len());
        for (i, q) in questions.iter().enumerate() {
            if index.insert(q.id.clone(), i).is_some() {
                return Err(CatalogError::DuplicateQuestion(q.id.clone()));
            }
        }
        Ok(Self { questions, index })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in 80-question survey: `q1`..`q80`, twenty per category in
    /// category order.
    pub fn standard() -> Self {
        let questions = (1..=Category::ORDINAL_SPAN * 4)
            .filter_map(|n| {
                Category::from_ordinal(n).map(|category| Question {
                    id: format!("q{}", n),
                    category,
                    text: None,
                    weighting: QuestionWeighting::default(),
                })
            })
            .collect::<Vec<_>>();
        let index = questions
            .iter()
            .enumerate()
            .map(|(i, q)| (q.id.clone(), i))
            .collect();
        Self { questions, index }
    }

    /// Load a catalog from a JSON array of questions.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let raw: Vec<RawQuestion> = serde_json::from_str(json)?;
        let questions = raw
            .into_iter()
            .map(|r| {
                let category =
                    Category::parse(&r.category).ok_or_else(|| CatalogError::UnknownCategory {
                        id: r.id.clone(),
                        category: r.category.clone(),
                    })?;
                Ok(Question {
                    id: r.id,
                    category,
                    text: r.text,
                    weighting: r.weighting,
                })
            })
            .collect::<Result<Vec<_>, CatalogError>>()?;
        Self::new(questions)
    }

    pub fn get(&self, id: &str) -> Option<&Question> {
        self.index.get(id).map(|&i| &self.questions[i])
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn count_in(&self, category: Category) -> u32 {
        self.questions
            .iter()
            .filter(|q| q.category == category)
            .count() as u32
    }

    /// Classify a question id: catalog entry first, then the numeric-range
    /// fallback on the id's ordinal. `None` means the answer is dropped.
    pub fn classify(&self, question_id: &str) -> Option<Category> {
        if let Some(q) = self.get(question_id) {
            return Some(q.category);
        }
        question_ordinal(question_id).and_then(Category::from_ordinal)
    }

    /// The catalogued question an answer key refers to. The whole key is
    /// tried first, then each suffix after a `-`, so `member-7-q12` tries
    /// `7-q12` and then `q12`, while a catalogued `chore-cooking` matches
    /// itself.
    pub fn lookup_answer(&self, key: &str) -> Option<&Question> {
        std::iter::once(key)
            .chain(key.match_indices('-').map(|(i, _)| &key[i + 1..]))
            .find_map(|candidate| self.get(candidate))
    }

    /// Category of an answer key: catalog match on the key or one of its
    /// suffixes, then the ordinal fallback on the last segment.
    pub fn classify_answer(&self, key: &str) -> Option<Category> {
        match self.lookup_answer(key) {
            Some(q) => Some(q.category),
            None => question_ordinal(question_key(key)).and_then(Category::from_ordinal),
        }
    }
}

/// The ordinal encoded in a question id, e.g. `q45` → 45.
pub fn question_ordinal(question_id: &str) -> Option<u32> {
    let digits = question_id
        .strip_prefix('q')
        .or_else(|| question_id.strip_prefix('Q'))
        .unwrap_or(question_id);
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_has_twenty_per_category() {
        let catalog = QuestionCatalog::standard();
        assert_eq!(catalog.len(), 80);
        for category in Category::ALL {
            assert_eq!(catalog.count_in(category), 20);
        }
        assert_eq!(catalog.get("q41").map(|q| q.category), Some(Category::VisibleParental));
    }

    #[test]
    fn classify_prefers_catalog_over_ordinal() {
        let catalog = QuestionCatalog::new(vec![Question {
            id: "q1".to_string(),
            category: Category::InvisibleParental,
            text: None,
            weighting: QuestionWeighting::default(),
        }])
        .unwrap();

        assert_eq!(catalog.classify("q1"), Some(Category::InvisibleParental));
        assert_eq!(catalog.classify("q25"), Some(Category::InvisibleHousehold));
        assert_eq!(catalog.classify("q99"), None);
        assert_eq!(catalog.classify("mood"), None);
    }

    #[test]
    fn answer_keys_match_hyphenated_ids_before_splitting() {
        let json = r#"[
            {"id": "chore-cooking", "category": "invisible_parental"},
            {"id": "q3", "category": "visible_parental"}
        ]"#;
        let catalog = QuestionCatalog::from_json(json).unwrap();

        let id = |key: &str| catalog.lookup_answer(key).map(|q| q.id.clone());
        assert_eq!(id("chore-cooking").as_deref(), Some("chore-cooking"));
        assert_eq!(id("mom-chore-cooking").as_deref(), Some("chore-cooking"));
        assert_eq!(id("member-2-q3").as_deref(), Some("q3"));
        assert_eq!(id("cooking"), None);

        assert_eq!(catalog.classify_answer("chore-cooking"), Some(Category::InvisibleParental));
        assert_eq!(catalog.classify_answer("dad-q25"), Some(Category::InvisibleHousehold));
        assert_eq!(catalog.classify_answer("chore-dishes"), None);
    }

    #[test]
    fn loads_json_with_display_names() {
        let json = r#"[
            {"id": "q1", "category": "Visible Household Tasks", "text": "Who cooks?"},
            {"id": "q2", "category": "invisible_parental",
             "weighting": {"frequency": "daily", "emotional_labor": "high"}}
        ]"#;

        let catalog = QuestionCatalog::from_json(json).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("q1").unwrap().text.as_deref(), Some("Who cooks?"));
        assert_eq!(catalog.get("q2").unwrap().category, Category::InvisibleParental);
    }

    #[test]
    fn rejects_duplicates_and_unknown_categories() {
        let dup = r#"[{"id": "q1", "category": "visible_household"},
                      {"id": "q1", "category": "visible_parental"}]"#;
        assert!(matches!(
            QuestionCatalog::from_json(dup),
            Err(CatalogError::DuplicateQuestion(id)) if id == "q1"
        ));

        let unknown = r#"[{"id": "q1", "category": "Garden"}]"#;
        assert!(matches!(
            QuestionCatalog::from_json(unknown),
            Err(CatalogError::UnknownCategory { .. })
        ));
    }
}
