use serde::Deserialize;

/// A single row of the traffic matrix, e.g. `h1,h8,128,4M`.
#[derive(Debug, Clone, Deserialize)]
pub struct FlowDto {
    pub src: String,
    pub dst: String,
    pub tos: String,
    pub rate: String,
}
