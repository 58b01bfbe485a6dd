use serde::{Deserialize, Serialize};
use slotline_core::Candidate;

/// One roster CSV row.
///
/// Header: `name,email,phone,year,lib_id,branch,domains`; `domains` is
/// `;`-separated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterRow {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub year: Option<u8>,
    #[serde(default)]
    pub lib_id: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub domains: Option<String>,
}

impl RosterRow {
    pub fn domain_list(&self) -> Vec<String> {
        self.domains
            .as_deref()
            .unwrap_or("")
            .split(';')
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(String::from)
            .collect()
    }

    pub fn into_candidate(self, id: String) -> Candidate {
        let domains = self.domain_list();
        let mut c = Candidate::new(id, self.name.trim(), self.email.trim()).with_domains(domains);
        c.phone = self.phone.filter(|p| !p.trim().is_empty());
        c.year = self.year;
        c.lib_id = self.lib_id.filter(|s| !s.trim().is_empty());
        c.branch = self.branch.filter(|s| !s.trim().is_empty());
        c
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRow {
    /// 1-based data row number (header excluded).
    pub row: usize,
    pub email: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub imported: Vec<String>,
    pub skipped: Vec<SkippedRow>,
}
