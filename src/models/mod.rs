pub mod marketmodel;
