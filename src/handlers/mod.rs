// handlers/mod.rs - Three handler tiers
//
// public    - no authentication (/health)
// protected - active profile required (/rest/v1/*, /functions/v1/me)
// elevated  - role allow-list, then elevated credentials (/functions/v1/admin-*)

pub mod elevated;
pub mod protected;
pub mod public;
