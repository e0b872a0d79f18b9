// ============================================================================
// MODELS - MODULE PRINCIPAL
// ============================================================================
//
// Description:
//   Point d'entrée pour tous les modèles de données.
//   Chaque entité correspond à une table avec SeaORM.
//
// Liste des modules:
//   - health : Health check API
//   - users : Utilisateurs (handle unique + hash PBKDF2)
//   - titles : Titres partagés (film/série TMDB), uniques par (catalog_id, kind)
//   - interactions : Note/critique/statut d'un utilisateur sur un titre
//   - dto : Data Transfer Objects pour les réponses API
//
// Points d'attention:
//   - Tous les modèles utilisent SeaORM (pas de SQL brut)
//   - Les index uniques composites sont créés dans db::setup_schema
//
// ============================================================================

pub mod health;
pub mod users;
pub mod titles;
pub mod interactions;
pub mod dto;
