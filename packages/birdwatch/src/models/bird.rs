use serde::Serialize;

use crate::entity::bird;
use crate::error::AppError;

use super::form::{FieldKind, FieldSpec, FormView, Rule};

/// Upper bound for weight and sighting count.
pub const MAX_MEASURE: i64 = 1_000_000;

/// Editable fields of a sighting, in display order. The owner is never part
/// of the form: it is filled from the caller's identity on insert.
pub const BIRD_FORM: &[FieldSpec] = &[
    FieldSpec {
        name: "species_name",
        label: "Species",
        kind: FieldKind::Text,
        rules: &[Rule::NotEmpty],
    },
    FieldSpec {
        name: "weight",
        label: "Weight",
        kind: FieldKind::Float,
        rules: &[Rule::FloatInRange {
            min: 0.0,
            max: MAX_MEASURE as f64,
        }],
    },
    FieldSpec {
        name: "diet",
        label: "Diet",
        kind: FieldKind::Text,
        rules: &[Rule::NotEmpty],
    },
    FieldSpec {
        name: "habitat",
        label: "Habitat",
        kind: FieldKind::Text,
        rules: &[Rule::NotEmpty],
    },
    FieldSpec {
        name: "sighting_count",
        label: "Count",
        kind: FieldKind::Integer,
        rules: &[Rule::IntInRange {
            min: 0,
            max: MAX_MEASURE,
        }],
    },
];

/// Typed values of an accepted bird form.
#[derive(Debug, Clone, PartialEq)]
pub struct BirdInput {
    pub species_name: String,
    pub weight: f64,
    pub diet: String,
    pub habitat: String,
    pub sighting_count: i32,
}

impl TryFrom<&FormView> for BirdInput {
    type Error = AppError;

    fn try_from(form: &FormView) -> Result<Self, Self::Error> {
        if !form.accepted {
            return Err(AppError::InvalidForm(form.clone()));
        }
        let text = |name: &str| {
            form.value(name)
                .map(str::to_string)
                .ok_or_else(|| AppError::Validation(format!("Missing field {name}")))
        };
        let number_error = |name: &str| AppError::Validation(format!("Invalid number in {name}"));

        Ok(Self {
            species_name: text("species_name")?,
            weight: text("weight")?
                .parse()
                .map_err(|_| number_error("weight"))?,
            diet: text("diet")?,
            habitat: text("habitat")?,
            sighting_count: text("sighting_count")?
                .parse()
                .map_err(|_| number_error("sighting_count"))?,
        })
    }
}

/// Form pre-filled with a stored sighting's editable values.
pub fn prefilled_form(model: &bird::Model) -> FormView {
    FormView::prefilled(BIRD_FORM, |name| match name {
        "species_name" => model.species_name.clone(),
        "weight" => model.weight.to_string(),
        "diet" => model.diet.clone(),
        "habitat" => model.habitat.clone(),
        "sighting_count" => model.sighting_count.to_string(),
        _ => String::new(),
    })
}

/// Upper-case the first character, leaving the rest untouched.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Signed one-click action URLs for a listed sighting.
#[derive(Serialize, utoipa::ToSchema)]
pub struct BirdLinks {
    #[schema(example = "/api/v1/birds/edit/1?_signature=9f2c...")]
    pub edit: String,
    #[schema(example = "/api/v1/birds/inc/1?_signature=41ab...")]
    pub increment: String,
    #[schema(example = "/api/v1/birds/capitalize/1?_signature=c07e...")]
    pub capitalize: String,
}

/// A sighting as shown in the listing. The owner is not exposed.
#[derive(Serialize, utoipa::ToSchema)]
pub struct BirdResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Sparrow")]
    pub species_name: String,
    #[schema(example = 0.03)]
    pub weight: f64,
    #[schema(example = "seeds")]
    pub diet: String,
    #[schema(example = "urban")]
    pub habitat: String,
    #[schema(example = 1)]
    pub sighting_count: i32,
    pub links: BirdLinks,
}

impl BirdResponse {
    pub fn new(m: bird::Model, links: BirdLinks) -> Self {
        Self {
            id: m.id,
            species_name: m.species_name,
            weight: m.weight,
            diet: m.diet,
            habitat: m.habitat,
            sighting_count: m.sighting_count,
            links,
        }
    }
}

/// The caller's sightings.
#[derive(Serialize, utoipa::ToSchema)]
pub struct BirdListResponse {
    pub data: Vec<BirdResponse>,
    /// Where to fetch and post the insert form.
    #[schema(example = "/api/v1/birds/add")]
    pub add_url: String,
}
