use models::{CanonicalField, Transaction};
use spreadsheet_ingest::{Cell, RawTable};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("cannot identify the amount column; numeric candidates: {candidates:?}")]
    AmbiguousAmountColumn { candidates: Vec<String> },

    #[error("required column not found: {0}")]
    MissingColumn(CanonicalField),

    #[error("no rows left after amount coercion")]
    EmptyAfterCoercion,
}

/// Known header spellings, keyed by canonicalized header string.
/// First matching header wins when a file repeats a role.
const SYNONYMS: &[(&str, CanonicalField)] = &[
    ("id_client", CanonicalField::ClientId),
    ("client", CanonicalField::ClientId),
    ("client_id", CanonicalField::ClientId),
    ("montant", CanonicalField::Amount),
    ("montant_transaction", CanonicalField::Amount),
    ("montant_de_la_transaction", CanonicalField::Amount),
    ("montant_eur", CanonicalField::Amount),
    ("valeur", CanonicalField::Amount),
    ("amount", CanonicalField::Amount),
    ("categorie", CanonicalField::Category),
    ("categorie_produit", CanonicalField::Category),
    ("mode_paiement", CanonicalField::PaymentMode),
    ("paiement", CanonicalField::PaymentMode),
];

/// Canonicalize a raw header: lowercase, fold accents, strip currency symbols
/// and parentheses, trim, and join the remaining words with underscores.
pub fn canonical_header(raw: &str) -> String {
    let mut cleaned = String::with_capacity(raw.len());
    for c in raw.trim().to_lowercase().chars() {
        match c {
            '(' | ')' | '€' | '$' | '£' => {}
            c => cleaned.push(fold_accent(c)),
        }
    }
    cleaned.trim().replace(' ', "_")
}

fn fold_accent(c: char) -> char {
    match c {
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'à' | 'â' | 'ä' => 'a',
        'î' | 'ï' => 'i',
        'ô' | 'ö' => 'o',
        'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        c => c,
    }
}

fn lookup_synonym(canonical: &str) -> Option<CanonicalField> {
    SYNONYMS
        .iter()
        .find(|(name, _)| *name == canonical)
        .map(|(_, field)| *field)
}

/// Column indices of the four canonical fields in a [`RawTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumns {
    pub client: usize,
    pub amount: usize,
    pub category: usize,
    pub payment: usize,
}

/// Map raw headers onto the four canonical fields.
///
/// Headers go through [`canonical_header`] and the synonym table. When no
/// header names the amount, the fallback promotes the only all-numeric
/// unmapped column; zero or several such columns fail with the candidate
/// list. A missing client, category, or payment column is fatal.
pub fn resolve_columns(table: &RawTable) -> Result<ResolvedColumns, NormalizeError> {
    let mut client = None;
    let mut amount = None;
    let mut category = None;
    let mut payment = None;

    for (idx, header) in table.headers.iter().enumerate() {
        let Some(field) = lookup_synonym(&canonical_header(header)) else {
            continue;
        };
        let slot = match field {
            CanonicalField::ClientId => &mut client,
            CanonicalField::Amount => &mut amount,
            CanonicalField::Category => &mut category,
            CanonicalField::PaymentMode => &mut payment,
        };
        if slot.is_none() {
            *slot = Some(idx);
        }
    }

    let amount = match amount {
        Some(idx) => idx,
        None => {
            let mapped = [client, category, payment];
            let candidates: Vec<usize> = (0..table.headers.len())
                .filter(|idx| !mapped.contains(&Some(*idx)))
                .filter(|idx| is_numeric_column(table, *idx))
                .collect();
            match candidates.as_slice() {
                [only] => *only,
                _ => {
                    return Err(NormalizeError::AmbiguousAmountColumn {
                        candidates: candidates
                            .iter()
                            .map(|&idx| table.headers[idx].clone())
                            .collect(),
                    })
                }
            }
        }
    };

    Ok(ResolvedColumns {
        client: client.ok_or(NormalizeError::MissingColumn(CanonicalField::ClientId))?,
        amount,
        category: category.ok_or(NormalizeError::MissingColumn(CanonicalField::Category))?,
        payment: payment.ok_or(NormalizeError::MissingColumn(CanonicalField::PaymentMode))?,
    })
}

/// A column is numeric when it has at least one non-empty cell and every
/// non-empty cell parses as a number.
fn is_numeric_column(table: &RawTable, col: usize) -> bool {
    let mut seen_value = false;
    for row in &table.rows {
        if row[col].is_empty() {
            continue;
        }
        if row[col].as_number().is_none() {
            return false;
        }
        seen_value = true;
    }
    seen_value
}

/// Result of the amount-coercion pass over a raw table.
#[derive(Debug, Clone)]
pub struct CoercionReport {
    pub transactions: Vec<Transaction>,
    pub dropped_rows: usize,
}

/// Force the amount column to numeric, dropping every row whose amount does
/// not parse. Order-preserving; no row is added. All rows dropping out is a
/// fatal input error, not a valid empty dashboard.
pub fn coerce_rows(
    table: &RawTable,
    columns: &ResolvedColumns,
) -> Result<CoercionReport, NormalizeError> {
    let mut transactions = Vec::with_capacity(table.rows.len());
    let mut dropped_rows = 0;

    for row in &table.rows {
        let Some(amount) = row[columns.amount].as_number() else {
            dropped_rows += 1;
            continue;
        };
        transactions.push(Transaction {
            client_id: row[columns.client].as_text().unwrap_or_default(),
            amount,
            category: row[columns.category].as_text().unwrap_or_default(),
            payment_mode: row[columns.payment].as_text().unwrap_or_default(),
        });
    }

    if transactions.is_empty() {
        return Err(NormalizeError::EmptyAfterCoercion);
    }

    Ok(CoercionReport {
        transactions,
        dropped_rows,
    })
}
