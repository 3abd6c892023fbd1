mod jena_compat;
