// Biblioteca do middleware Pipefy
// Expõe módulos para uso em testes e binários

pub mod config;
pub mod handlers;
pub mod services;
pub mod utils;

use pipefy::PipefyClient;

// AppState é definido aqui para ser compartilhado
#[derive(Clone)]
pub struct AppState {
    pub settings: config::Settings,
    pub pipefy: PipefyClient,
}
