pub mod db;
pub mod accountdb;
pub mod escrowdb;
pub mod eventdb;
pub mod jobdb;
pub mod proposaldb;
pub mod userdb;
