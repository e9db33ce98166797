pub mod busca;
pub mod db_utils;
pub mod error;
pub mod money;
