//! Note templates
//!
//! Starter markdown bodies offered when creating a note. The catalog is
//! built per call because the meeting template stamps the current date.

use crate::api::NoteCreate;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub icon: &'static str,
    pub title: &'static str,
    pub content: String,
}

impl NoteTemplate {
    /// Create request for a fresh note built from this template
    pub fn note(&self) -> NoteCreate {
        let mut data = NoteCreate::titled(self.title);
        data.content = self.content.clone();
        data
    }
}

/// All templates, in picker order.
pub fn templates(today: NaiveDate) -> Vec<NoteTemplate> {
    vec![
        NoteTemplate {
            id: "meeting",
            name: "Meeting Notes",
            icon: "📋",
            title: "Meeting Notes",
            content: format!(
                "# Meeting Notes\n\n\
                 ## Date\n{}\n\n\
                 ## Attendees\n- \n\n\
                 ## Agenda\n1. \n\n\
                 ## Discussion\n\n\n\
                 ## Action Items\n- [ ] \n",
                today.format("%Y-%m-%d")
            ),
        },
        NoteTemplate {
            id: "journal",
            name: "Daily Journal",
            icon: "📝",
            title: "Daily Journal",
            content: "# Daily Journal\n\n\
                      ## How am I feeling today?\n\n\n\
                      ## What am I grateful for?\n1. \n2. \n3. \n\n\
                      ## What do I want to accomplish today?\n- [ ] \n\n\
                      ## Reflections\n\n"
                .to_string(),
        },
        NoteTemplate {
            id: "todo",
            name: "TODO List",
            icon: "✅",
            title: "TODO List",
            content: "# TODO List\n\n\
                      ## High Priority\n- [ ] \n\n\
                      ## Medium Priority\n- [ ] \n\n\
                      ## Low Priority\n- [ ] \n\n\
                      ## Done\n- [x] \n"
                .to_string(),
        },
    ]
}

pub fn find_template(id: &str, today: NaiveDate) -> Option<NoteTemplate> {
    templates(today).into_iter().find(|t| t.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wiki::extract_wiki_links;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    #[test]
    fn test_catalog_order() {
        let ids: Vec<_> = templates(day()).into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["meeting", "journal", "todo"]);
    }

    #[test]
    fn test_meeting_template_stamps_date() {
        let meeting = find_template("meeting", day()).unwrap();
        assert!(meeting.content.contains("## Date\n2025-03-14\n"));
        assert!(meeting.content.starts_with("# Meeting Notes\n"));
    }

    #[test]
    fn test_template_note_request() {
        let todo = find_template("todo", day()).unwrap();
        let data = todo.note();

        assert_eq!(data.title, "TODO List");
        assert_eq!(data.parent_id, None);
        assert!(data.content.ends_with("## Done\n- [x] \n"));
        assert!(extract_wiki_links(&data.content).is_empty());
    }

    #[test]
    fn test_unknown_template() {
        assert!(find_template("recipe", day()).is_none());
    }
}
