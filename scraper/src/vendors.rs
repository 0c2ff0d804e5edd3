mod allsports;
mod ctrun;
mod goodshot;
mod phomi;
mod raceshot;
mod soonnet;
mod soonnet_org;
mod sportag;
mod zsport;

pub use crate::vendors::allsports::AllSports;
pub use crate::vendors::ctrun::CtRun;
pub use crate::vendors::goodshot::GoodShot;
pub use crate::vendors::phomi::Phomi;
pub use crate::vendors::raceshot::RaceShot;
pub use crate::vendors::soonnet::Soonnet;
pub use crate::vendors::soonnet_org::SoonnetOrg;
pub use crate::vendors::sportag::Sportag;
pub use crate::vendors::zsport::ZSport;
