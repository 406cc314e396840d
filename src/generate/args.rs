use rand::Rng;

use crate::{
    strutils::rand_string,
    typing::ty::{IntTy, Ty},
};

/// Draws one command-line value per requested argument, in request order.
/// Every value parses back into its declared type with `str::parse`.
pub fn generate_args<R: Rng + ?Sized>(rng: &mut R, args: &[(String, Ty)]) -> Vec<String> {
    args.iter().map(|(_, ty)| arg_value(rng, ty)).collect()
}

fn arg_value<R: Rng + ?Sized>(rng: &mut R, ty: &Ty) -> String {
    match ty.canonical() {
        Ty::Int(i) => int_value(rng, i),
        Ty::Float(_) => format!("{:?}", rng.gen_range(-1024i32..1024) as f64 / 8.0),
        Ty::Bool => rng.gen_bool(0.5).to_string(),
        Ty::Str => {
            let len = rng.gen_range(1..=8);
            rand_string(rng, len)
        }
        // never requested; the prologue falls back to `Default` on a bad parse
        _ => String::new(),
    }
}

fn int_value<R: Rng + ?Sized>(rng: &mut R, ty: IntTy) -> String {
    ty.signed_value(rng.gen::<u128>()).to_string()
}
