/**
 * AISDECODE KERNEL - Fusion et diffusion de l'état des navires AIS
 *
 * Flux : adaptateur -> dédup -> codec -> merge dans le store -> relais (en parallèle)
 * -> cycle périodique : filtre de complétude -> détection de changement -> diffusion + sauvegarde.
 */

pub mod change;
pub mod codec;
pub mod config;
pub mod cycle;
pub mod dedupe;
pub mod engine;
pub mod health;
pub mod http;
pub mod ingest;
pub mod models;
pub mod persistence;
pub mod relay;
pub mod state;
pub mod store;
pub mod subscribers;
