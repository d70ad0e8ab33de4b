pub mod export_pack;
pub mod proof_run;
pub mod verify_pack;
