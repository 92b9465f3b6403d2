use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use super::{sanitize::sanitize_video_embed, tag::normalize_tags, ImageRecord, ProjectId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: ProjectId,
    pub title: String,
    /// already HTML escaped
    pub description: String,
    /// sanitized iframe markup or empty
    pub video_embed: String,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// in tag order
    pub tags: Vec<String>,
    /// newest first
    pub images: Vec<ImageRecord>,
}

/// The scalar columns of a project, normalized and ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFields {
    pub title: String,
    pub description: String,
    pub video_embed: String,
    pub date: DateTime<Utc>,
}

/// Raw admin form input for creating or updating a project
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectForm {
    pub title: String,
    pub description: String,
    pub video_embed: String,
    pub date: String,
    pub categories: Vec<String>,
    pub custom_tags: String,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidProjectForm {
    #[error("project title must not be empty")]
    EmptyTitle,
}

impl ProjectForm {
    pub fn normalize(
        &self,
        now: DateTime<Utc>,
    ) -> Result<(ProjectFields, Vec<String>), InvalidProjectForm> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(InvalidProjectForm::EmptyTitle);
        }
        let fields = ProjectFields {
            title: title.to_owned(),
            description: html_escape::encode_quoted_attribute(self.description.trim()).into_owned(),
            video_embed: sanitize_video_embed(&self.video_embed),
            date: parse_project_date(&self.date, now),
        };
        let tags = normalize_tags(&self.categories, &self.custom_tags);
        Ok((fields, tags))
    }
}

/// Parses `YYYY-MM-DD` as midnight UTC, anything else means `now`
pub fn parse_project_date(s: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| Utc.from_utc_datetime(&dt))
        .unwrap_or(now)
}

#[cfg(test)]
mod test {
    use super::*;
    use claims::assert_ok;
    use pretty_assertions::assert_eq;

    #[test]
    fn date_parsing_falls_back_to_now() {
        let now = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
        assert_eq!(
            parse_project_date("2023-01-15", now),
            Utc.with_ymd_and_hms(2023, 1, 15, 0, 0, 0).unwrap()
        );
        assert_eq!(parse_project_date("15.01.2023", now), now);
        assert_eq!(parse_project_date("", now), now);
    }

    #[test]
    fn normalize_escapes_and_sanitizes() {
        let now = Utc::now();
        let form = ProjectForm {
            title: "  Spot & Co  ".into(),
            description: "<b>bold</b> & more".into(),
            video_embed: "<script>alert(1)</script>".into(),
            date: "2022-02-02".into(),
            categories: vec!["Commercial".into()],
            custom_tags: "behind the scenes, commercial".into(),
        };
        let (fields, tags) = assert_ok!(form.normalize(now));
        // titles are plain text, only trimmed
        assert_eq!(fields.title, "Spot & Co");
        assert_eq!(fields.description, "&lt;b&gt;bold&lt;/b&gt; &amp; more");
        assert_eq!(fields.video_embed, "");
        assert_eq!(tags, vec!["Commercial", "behind the scenes"]);
    }

    #[test]
    fn normalize_rejects_blank_title() {
        let form = ProjectForm {
            title: "   ".into(),
            ..Default::default()
        };
        assert_eq!(form.normalize(Utc::now()), Err(InvalidProjectForm::EmptyTitle));
    }
}
