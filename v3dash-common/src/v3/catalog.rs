//! V3 field catalog
//!
//! The closed set of keys making up a V3 record, in display order, plus the
//! two priority lists used to grade missing fields.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Every V3 field key, in catalog order
pub const FIELD_CATALOG: &[&str] = &[
    "nom_projet",
    "date_projet",
    "nom_MO",
    "Adresse_MO",
    "nom_mission",
    "date_création",
    "nom_mo",
    "NOM_MOE_mandataire",
    "Adresse_moe_mandataire",
    "nature_opération",
    "description_projet",
    "nom_du_site",
    "nom_bâtiments",
    "adresse_maitre_ouvrage",
    "nom_maitre_ouvrage",
    "project_type",
    "bâtiments_concernés",
    "site_présentation",
    "project_phase",
    "site_part_concerned",
    "nom_du_partenaire",
    "diagnostics_type",
    "date_diagnotsic",
    "nombre_dechet",
    "nombre_tonnes_rémploi",
    "Ressources_PEMD",
    "nom_de_société",
    "rapport_type_num",
    "indique_true",
    "indique_false",
    "rapport_type_true",
    "rapport_type_false",
    "nom_de_la_société",
    "rapport_type_termites_true",
    "rapport_type_termites_false",
    "rapport_type_amiante_true",
    "rapport_type_amiante_false",
    "présence_amiante_true",
    "présence_amiante_false",
    "type_étanchéités_true",
    "type_étanchéités_false",
    "enrobés_de_parking_true",
    "enrobés_de_parking_false",
    "étanchéités_de_toiture",
    "localisation_transformsteurs",
    "date_inventaire",
    "prénom_represente",
    "nom_represente",
    "fonction_represente",
    "prénom_charge_diagnostic",
    "fonction_charge_diagnositc",
    "ressource_operation",
    "prénom_structure",
    "nom_structure",
    "Nom_de_la_structure",
    "sondage_déstructif_true",
    "sondage_déstructif_false",
    "site_occupé_true",
    "presence_amiante_true",
    "non_reception_true",
    "description_de_l_opération",
    "Nom_du_MOA",
    "bâtiments_espaces",
    "nom_de_l_opération",
    "concours",
    "cité_document_concerné",
    "description_succincte_du_programme",
    "nom_du_batiment",
    "année_de_construction",
    "Usage_actuel_ou_ancien_usage",
    "déconstruction_rénovation_conservation",
    "occupé_vide_en_travaux_en_désamiantage",
    "Usage_actuel_true",
    "batiment_state",
    "Etat_des_bâtiments",
    "Présence_d_amiante",
    "Mise_en_œuvre",
    "Année_construction_bâtiment",
    "Charpente_bois_true",
    "toiture_terrasse_béton_true",
    "Châssis_aluminium_true",
    "double_vitrage_true",
];

/// Number of fields in a V3 record
pub const FIELD_COUNT: usize = FIELD_CATALOG.len();

/// Fields whose absence is graded `high`
pub const HIGH_PRIORITY_FIELDS: &[&str] = &[
    "nom_projet",
    "nom_MO",
    "date_création",
    "nom_du_site",
    "description_projet",
    "présence_amiante_true",
    "présence_amiante_false",
];

/// Fields whose absence is graded `medium`
pub const MEDIUM_PRIORITY_FIELDS: &[&str] = &[
    "date_projet",
    "Adresse_MO",
    "nom_mission",
    "NOM_MOE_mandataire",
    "Adresse_moe_mandataire",
    "nature_opération",
    "nom_bâtiments",
];

static FIELD_INDEX: Lazy<HashMap<&'static str, usize>> = Lazy::new(|| {
    FIELD_CATALOG
        .iter()
        .enumerate()
        .map(|(idx, key)| (*key, idx))
        .collect()
});

/// Position of `key` in the catalog (exact, case-sensitive match)
pub fn field_index(key: &str) -> Option<usize> {
    FIELD_INDEX.get(key).copied()
}

/// Whether `key` belongs to the catalog
pub fn is_catalog_field(key: &str) -> bool {
    field_index(key).is_some()
}

/// Human-readable label for a field key (underscores become spaces)
pub fn field_label(key: &str) -> String {
    key.replace('_', " ")
}
