mod negotiate;
mod properties;
mod validate;
