pub(crate) mod compare;
pub(crate) mod corpus;
pub(crate) mod verify;

pub(crate) use compare::*;
pub(crate) use corpus::*;
pub(crate) use verify::*;
