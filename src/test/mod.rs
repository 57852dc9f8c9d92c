mod builder;
mod route_descriptor;
mod scenarios;
mod sequential;
mod szudzik;
mod timewarp_lp;
