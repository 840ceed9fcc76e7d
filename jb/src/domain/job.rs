//! Job postings

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::refs::{Identified, Ref};

/// Employment type of a posting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobType {
    FullTime,
    PartTime,
    Contract,
    Internship,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::FullTime => "full-time",
            JobType::PartTime => "part-time",
            JobType::Contract => "contract",
            JobType::Internship => "internship",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full-time" => Ok(JobType::FullTime),
            "part-time" => Ok(JobType::PartTime),
            "contract" => Ok(JobType::Contract),
            "internship" => Ok(JobType::Internship),
            other => Err(format!(
                "Invalid job type '{}'. Expected one of: full-time, part-time, contract, internship",
                other
            )),
        }
    }
}

/// Salary range, either bound optional
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Salary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<u64>,
}

/// Render a salary the way job cards show it
pub fn format_salary(salary: Option<&Salary>) -> String {
    match salary {
        Some(Salary {
            min: Some(min),
            max: Some(max),
        }) => format!("${} - ${}", group_thousands(*min), group_thousands(*max)),
        Some(Salary { min: Some(min), max: None }) => format!("${}+", group_thousands(*min)),
        Some(Salary { min: None, max: Some(max) }) => format!("Up to ${}", group_thousands(*max)),
        _ => "Not specified".to_string(),
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Employer summary populated into `createdBy`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Owner {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

impl Identified for Owner {
    fn id(&self) -> &str {
        &self.id
    }
}

fn default_active() -> bool {
    true
}

/// A job posting as returned by the jobs API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub company: String,
    pub location: String,
    #[serde(rename = "type")]
    pub job_type: JobType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary: Option<Salary>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<Ref<Owner>>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub application_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Description cut to `max` characters with an ellipsis
    pub fn excerpt(&self, max: usize) -> String {
        if self.description.chars().count() <= max {
            return self.description.clone();
        }
        let cut: String = self.description.chars().take(max).collect();
        format!("{}…", cut)
    }

    /// Case-insensitive match on title, company, location or any skill
    ///
    /// A blank term matches every job.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        [&self.title, &self.company, &self.location]
            .into_iter()
            .chain(&self.skills)
            .any(|field| field.to_lowercase().contains(&term))
    }
}

/// Payload for creating a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewJob {
    pub title: String,
    pub description: String,
    pub company: String,
    pub location: String,
    #[serde(rename = "type")]
    pub job_type: JobType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary: Option<Salary>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn searchable() -> Job {
        serde_json::from_value(json!({
            "_id": "j1",
            "title": "Backend Engineer",
            "description": "Build things",
            "company": "Ferrous Systems",
            "location": "Berlin",
            "type": "full-time",
            "skills": ["Rust", "PostgreSQL"]
        }))
        .unwrap()
    }

    #[test]
    fn test_matches_any_searchable_field() {
        let job = searchable();
        assert!(job.matches("backend"));
        assert!(job.matches("FERROUS"));
        assert!(job.matches("berl"));
        assert!(job.matches("postgres"));
        assert!(!job.matches("python"));
        // Description is not searched
        assert!(!job.matches("things"));
    }

    #[test]
    fn test_blank_term_matches_everything() {
        let job = searchable();
        assert!(job.matches(""));
        assert!(job.matches("   "));
    }

    #[test]
    fn test_format_salary() {
        let both = Salary {
            min: Some(60000),
            max: Some(1250000),
        };
        assert_eq!(format_salary(Some(&both)), "$60,000 - $1,250,000");

        let min_only = Salary {
            min: Some(900),
            max: None,
        };
        assert_eq!(format_salary(Some(&min_only)), "$900+");

        let max_only = Salary {
            min: None,
            max: Some(100000),
        };
        assert_eq!(format_salary(Some(&max_only)), "Up to $100,000");

        assert_eq!(format_salary(Some(&Salary::default())), "Not specified");
        assert_eq!(format_salary(None), "Not specified");
    }

    #[test]
    fn test_deserialize_populated_job() {
        let job: Job = serde_json::from_value(json!({
            "_id": "j1",
            "title": "Rust Engineer",
            "description": "Build things",
            "company": "Acme",
            "location": "Remote",
            "type": "full-time",
            "salary": {"min": 100000},
            "skills": ["rust", "tokio"],
            "createdBy": {"_id": "u1", "name": "Ada", "company": "Acme"},
            "applicationCount": 3,
            "createdAt": "2025-03-01T12:00:00.000Z"
        }))
        .unwrap();

        assert_eq!(job.id, "j1");
        assert_eq!(job.job_type, JobType::FullTime);
        assert!(job.is_active);
        assert_eq!(job.application_count, 3);
        assert_eq!(job.skills, vec!["rust", "tokio"]);
        assert_eq!(job.created_by.as_ref().map(|r| r.id()), Some("u1"));
        assert!(job.created_at.is_some());
    }

    #[test]
    fn test_deserialize_unpopulated_owner() {
        let job: Job = serde_json::from_value(json!({
            "_id": "j2",
            "title": "Intern",
            "company": "Acme",
            "location": "Berlin",
            "type": "internship",
            "createdBy": "u9",
            "isActive": false
        }))
        .unwrap();

        assert_eq!(job.created_by, Some(Ref::Id("u9".to_string())));
        assert!(!job.is_active);
        assert_eq!(job.description, "");
    }

    #[test]
    fn test_job_type_parse() {
        assert_eq!("Part-Time".parse::<JobType>().unwrap(), JobType::PartTime);
        assert!("gig".parse::<JobType>().is_err());
    }

    #[test]
    fn test_excerpt() {
        let mut job: Job = serde_json::from_value(json!({
            "_id": "j3", "title": "t", "company": "c", "location": "l", "type": "contract"
        }))
        .unwrap();
        job.description = "abcdef".to_string();
        assert_eq!(job.excerpt(10), "abcdef");
        assert_eq!(job.excerpt(3), "abc…");
    }
}
