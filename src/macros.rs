macro_rules! str {
    ($s:expr) => {
        $s.to_string()
    };
}

macro_rules! unless {
    ($ex:expr, else $else_block:expr) => {
        match $ex {
            Some(x) => x,
            _ => $else_block,
        }
    };
    ($ex:expr) => {
        match $ex {
            Some(x) => x,
            _ => return Ok(None),
        }
    };
}
