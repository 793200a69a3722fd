//! Contract document renderer
//!
//! Pure pagination of an engagement into the downloadable contract artifact.
//! Two details are output contracts: missing optional fields render as the
//! literal "N/A", and the contract number is the numeric id zero-padded to at
//! least three digits as `CN-###`.

use crate::models::Engagement;

/// Character columns available per line.
pub const PAGE_WIDTH: usize = 72;
/// Lines per page before a break.
pub const PAGE_LINES: usize = 48;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub lines: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ContractDocument {
    pub contract_number: String,
    pub pages: Vec<Page>,
}

impl ContractDocument {
    /// Serialize the artifact; pages are separated by a form feed.
    pub fn to_text(&self) -> String {
        self.pages
            .iter()
            .map(|p| p.lines.join("\n"))
            .collect::<Vec<_>>()
            .join("\n\u{0c}\n")
    }
}

/// `CN-` plus the id zero-padded to a minimum of three digits.
pub fn contract_number(id: i64) -> String {
    format!("CN-{:03}", id)
}

fn field(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("N/A")
}

/// Greedy word wrap to `width` columns. Words longer than a full line are
/// split hard.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let mut chars: Vec<char> = word.chars().collect();
        while chars.len() > width {
            if current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            lines.push(chars[..width].iter().collect());
            chars.drain(..width);
        }
        let word_len = chars.len();
        if word_len == 0 {
            continue;
        }
        let word: String = chars.into_iter().collect();
        if current_len == 0 {
            current = word;
            current_len = word_len;
        } else if current_len + 1 + word_len <= width {
            current.push(' ');
            current.push_str(&word);
            current_len += 1 + word_len;
        } else {
            lines.push(std::mem::take(&mut current));
            current = word;
            current_len = word_len;
        }
    }
    if current_len > 0 {
        lines.push(current);
    }
    lines
}

pub fn render(engagement: &Engagement) -> ContractDocument {
    let number = contract_number(engagement.id);
    let candidate = &engagement.application.candidate;
    let job = &engagement.application.job;
    let company = &job.company;

    let mut lines: Vec<String> = Vec::new();

    lines.push(format!("EMPLOYMENT ENGAGEMENT CONTRACT {}", number));
    lines.push(String::new());

    lines.push("PARTY A (COMPANY)".to_string());
    lines.push(format!("  Name:                {}", company.name));
    lines.push(format!("  Address:             {}", field(&company.address)));
    lines.push(format!(
        "  Registration number: {}",
        field(&company.registration_number)
    ));
    lines.push(String::new());

    lines.push("PARTY B (OPERATIVE)".to_string());
    lines.push(format!("  Name:                {}", candidate.full_name));
    lines.push(format!("  Address:             {}", field(&candidate.address)));
    lines.push(format!("  Licence number:      {}", field(&candidate.licence_number)));
    lines.push(format!("  Bank name:           {}", field(&candidate.bank_name)));
    lines.push(format!("  Bank account:        {}", field(&candidate.bank_account)));
    lines.push(String::new());

    lines.push("ENGAGEMENT".to_string());
    lines.push(format!("  Position:            {}", job.title));
    lines.push(format!("  Start:               {}", field(&engagement.start_time)));
    lines.push(format!("  End:                 {}", field(&engagement.end_time)));
    lines.push(String::new());

    lines.push("REMUNERATION".to_string());
    lines.push(format!("  Pay rate:            {:.2}", engagement.pay_rate));
    lines.push(format!("  Total amount:        {:.2}", engagement.total_amount));
    lines.push(String::new());

    lines.push("JOB DETAILS".to_string());
    for line in wrap(&job.description, PAGE_WIDTH) {
        lines.push(line);
    }
    lines.push(String::new());

    lines.push("SIGNATURES".to_string());
    lines.push(format!(
        "  Party A:             {}",
        engagement
            .signature_party_a
            .as_deref()
            .map(|_| "signed")
            .unwrap_or("pending")
    ));
    lines.push(format!(
        "  Party B:             {}",
        engagement
            .signature_party_b
            .as_deref()
            .map(|_| "signed")
            .unwrap_or("pending")
    ));

    let pages = lines
        .chunks(PAGE_LINES)
        .map(|chunk| Page {
            lines: chunk.to_vec(),
        })
        .collect();

    ContractDocument {
        contract_number: number,
        pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AmendmentState, Application, Candidate, Company, ContractStatus, Engagement, JobDetails,
    };

    fn engagement(id: i64, description: &str) -> Engagement {
        Engagement {
            id,
            application: Application {
                id: 1,
                candidate: Candidate {
                    id: 2,
                    full_name: "Avery Cole".into(),
                    address: None,
                    bank_name: Some("First Bank".into()),
                    bank_account: None,
                    licence_number: None,
                },
                job: JobDetails {
                    id: 3,
                    title: "Night watch".into(),
                    description: description.into(),
                    company: Company {
                        name: "Acme Security".into(),
                        address: Some("1 High St".into()),
                        registration_number: None,
                    },
                },
            },
            signature_party_a: Some("a.png".into()),
            signature_party_b: None,
            total_amount: 1200.0,
            pay_rate: 25.0,
            start_time: Some("2026-09-01".into()),
            end_time: None,
            status: ContractStatus::Pending,
            amendment: AmendmentState::NotAmend,
        }
    }

    #[test]
    fn contract_number_pads_to_three_digits() {
        assert_eq!(contract_number(7), "CN-007");
        assert_eq!(contract_number(42), "CN-042");
        assert_eq!(contract_number(123), "CN-123");
        assert_eq!(contract_number(4567), "CN-4567");
    }

    #[test]
    fn missing_optional_fields_render_as_na() {
        let doc = render(&engagement(7, "guard duty"));
        let text = doc.to_text();
        assert!(text.contains("Registration number: N/A"));
        assert!(text.contains("Address:             N/A"));
        assert!(text.contains("Bank account:        N/A"));
        assert!(text.contains("Licence number:      N/A"));
        assert!(text.contains("End:                 N/A"));
        // Present fields keep their values.
        assert!(text.contains("Bank name:           First Bank"));
    }

    #[test]
    fn header_carries_contract_number() {
        let doc = render(&engagement(9, "guard duty"));
        assert_eq!(doc.contract_number, "CN-009");
        assert!(doc.pages[0].lines[0].ends_with("CN-009"));
    }

    #[test]
    fn signature_slots_render_state() {
        let text = render(&engagement(7, "guard duty")).to_text();
        assert!(text.contains("Party A:             signed"));
        assert!(text.contains("Party B:             pending"));
    }

    #[test]
    fn long_descriptions_wrap_to_page_width() {
        let description = "patrol ".repeat(100);
        let doc = render(&engagement(7, &description));
        for page in &doc.pages {
            for line in &page.lines {
                assert!(line.len() <= PAGE_WIDTH + 24, "line too long: {:?}", line);
            }
        }
    }

    #[test]
    fn wrap_splits_on_word_boundaries() {
        let lines = wrap("one two three four", 9);
        assert_eq!(lines, vec!["one two", "three", "four"]);
    }

    #[test]
    fn wrap_hard_splits_oversized_words() {
        let lines = wrap("abcdefghij", 4);
        assert_eq!(lines, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn very_long_documents_paginate() {
        let description = "word ".repeat(2000);
        let doc = render(&engagement(7, &description));
        assert!(doc.pages.len() > 1);
        for page in &doc.pages {
            assert!(page.lines.len() <= PAGE_LINES);
        }
    }
}
