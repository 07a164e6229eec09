pub mod dimensions;
pub mod engine;
pub mod gather;
pub mod weights;

pub use dimensions::{Dimension, DimensionContext, DimensionInputs, DimensionScores};
pub use engine::{EffectEngine, EffectResult, EventMeta, ScoredDimensions, StakeSize};
pub use gather::{
    DimensionGatherer, DimensionSource, GameRecordChaosSource, GatherOptions, GatherReport,
    StaticSource,
};
pub use weights::{CategoryWeights, WeightOverrides};
